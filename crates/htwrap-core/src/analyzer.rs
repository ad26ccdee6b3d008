//! Login-wall detection.
//!
//! One GET (redirects followed), then a fixed, ordered list of static checks
//! against the final URL, the page text and the markup. The first check that
//! matches decides. Any fetch failure is logged and reported as "no login
//! required" so the caller is never blocked by the probe.

use anyhow::{Context, Result};
use scraper::{Html, Selector};

use crate::config::DEFAULT_USER_AGENT;

const URL_FRAGMENTS: &[&str] = &["/login", "/signin", "/auth"];
const GATE_PHRASES: &[&str] = &["login required", "please sign in", "create account"];
const LOGIN_SELECTORS: &[&str] = &[r#"input[type="password"]"#, r#"form[action*="login"]"#];

/// Which check fired, and on what.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchReason {
    /// The post-redirect URL contains an auth path fragment.
    UrlFragment(&'static str),
    /// The page text contains an access-gate phrase.
    PageText(&'static str),
    /// The markup contains an element matching a login-form selector.
    LoginMarkup(&'static str),
}

/// Outcome of one probe. Computed fresh per call, never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginVerdict {
    /// Where the user should log in (final URL for a URL match, else the requested URL).
    pub url: String,
    /// `Some` when login looks required.
    pub reason: Option<MatchReason>,
}

impl LoginVerdict {
    fn open(url: &str) -> Self {
        Self {
            url: url.to_string(),
            reason: None,
        }
    }

    pub fn requires_login(&self) -> bool {
        self.reason.is_some()
    }

    /// `(requires_login, url)`.
    pub fn into_pair(self) -> (bool, String) {
        (self.reason.is_some(), self.url)
    }
}

/// A fetched document after redirects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub final_url: String,
    pub body: String,
}

/// Performs the single outbound GET. Blocking; call from `spawn_blocking` in async code.
pub trait PageFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<FetchedPage>;
}

/// libcurl-backed fetcher. No timeouts are set; libcurl defaults apply.
#[derive(Debug, Clone)]
pub struct CurlFetcher {
    user_agent: String,
}

impl Default for CurlFetcher {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl PageFetcher for CurlFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedPage> {
        let mut body: Vec<u8> = Vec::new();

        let mut easy = curl::easy::Easy::new();
        easy.url(url).context("invalid URL")?;
        easy.follow_location(true)?;
        easy.useragent(&self.user_agent)?;
        easy.accept_encoding("")?;

        {
            let mut transfer = easy.transfer();
            transfer.write_function(|data| {
                body.extend_from_slice(data);
                Ok(data.len())
            })?;
            transfer.perform().context("GET request failed")?;
        }

        let final_url = easy
            .effective_url()
            .context("no effective URL")?
            .unwrap_or(url)
            .to_string();
        let code = easy.response_code().unwrap_or(0);
        tracing::debug!(url, final_url = %final_url, code, bytes = body.len(), "login probe fetched");

        Ok(FetchedPage {
            final_url,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}

/// What a check inspects.
#[derive(Debug, Clone, Copy)]
enum Check {
    UrlFragment(&'static [&'static str]),
    PageText(&'static [&'static str]),
    Markup(&'static [&'static str]),
}

/// Which URL a positive verdict reports.
#[derive(Debug, Clone, Copy)]
enum UrlSource {
    Final,
    Requested,
}

/// Evaluated top to bottom; first match wins.
const LOGIN_CHECKS: [(Check, UrlSource); 3] = [
    (Check::UrlFragment(URL_FRAGMENTS), UrlSource::Final),
    (Check::PageText(GATE_PHRASES), UrlSource::Requested),
    (Check::Markup(LOGIN_SELECTORS), UrlSource::Requested),
];

struct PageView<'a> {
    final_url: String,
    text: String,
    document: &'a Html,
}

impl Check {
    fn find(&self, page: &PageView<'_>) -> Result<Option<MatchReason>> {
        match *self {
            Check::UrlFragment(fragments) => Ok(fragments
                .iter()
                .copied()
                .find(|f| page.final_url.contains(*f))
                .map(MatchReason::UrlFragment)),
            Check::PageText(phrases) => Ok(phrases
                .iter()
                .copied()
                .find(|p| page.text.contains(*p))
                .map(MatchReason::PageText)),
            Check::Markup(selectors) => {
                for &css in selectors {
                    let selector = Selector::parse(css)
                        .map_err(|e| anyhow::anyhow!("invalid selector {}: {:?}", css, e))?;
                    if page.document.select(&selector).next().is_some() {
                        return Ok(Some(MatchReason::LoginMarkup(css)));
                    }
                }
                Ok(None)
            }
        }
    }
}

/// Apply the ordered checks to an already-fetched page.
pub fn evaluate(requested_url: &str, page: &FetchedPage) -> Result<LoginVerdict> {
    let document = Html::parse_document(&page.body);
    let view = PageView {
        final_url: page.final_url.to_lowercase(),
        text: document.root_element().text().collect::<String>().to_lowercase(),
        document: &document,
    };

    for (check, source) in LOGIN_CHECKS.iter() {
        if let Some(reason) = check.find(&view)? {
            let url = match source {
                UrlSource::Final => page.final_url.clone(),
                UrlSource::Requested => requested_url.to_string(),
            };
            return Ok(LoginVerdict {
                url,
                reason: Some(reason),
            });
        }
    }
    Ok(LoginVerdict::open(requested_url))
}

/// Decides whether a site sits behind a login wall.
pub struct SiteAnalyzer {
    fetcher: Box<dyn PageFetcher>,
}

impl Default for SiteAnalyzer {
    fn default() -> Self {
        Self::new(CurlFetcher::default())
    }
}

impl SiteAnalyzer {
    pub fn new(fetcher: impl PageFetcher + 'static) -> Self {
        Self {
            fetcher: Box::new(fetcher),
        }
    }

    /// Fetch `url` once and run the checks. Never returns an error: failures
    /// are logged and yield a "no login required" verdict for `url`.
    pub fn check_login_required(&self, url: &str) -> LoginVerdict {
        let result = self
            .fetcher
            .fetch(url)
            .and_then(|page| evaluate(url, &page));
        match result {
            Ok(verdict) => {
                if let Some(reason) = verdict.reason {
                    tracing::info!(url, login_url = %verdict.url, ?reason, "login appears required");
                } else {
                    tracing::debug!(url, "no login wall detected");
                }
                verdict
            }
            Err(e) => {
                tracing::warn!(url, "error checking login requirement: {:#}", e);
                LoginVerdict::open(url)
            }
        }
    }
}

impl std::fmt::Debug for SiteAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteAnalyzer").finish_non_exhaustive()
    }
}
