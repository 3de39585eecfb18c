use async_trait::async_trait;
use chrono::Utc;
use scraper::{ElementRef, Html, Selector};
use tokio::sync::RwLock;
use ws_core::{Error, Locator, Node, PageDriver, Result};

const MHTML_BOUNDARY: &str = "----MultipartBoundary--ws-static";

struct LoadedPage {
    url: String,
    html: String,
}

/// Page driver over plain HTTP: no script runs, the served HTML is the page.
pub struct StaticPage {
    client: reqwest::Client,
    current: RwLock<Option<LoadedPage>>,
}

impl StaticPage {
    pub fn new() -> Self {
        Self::with_client(reqwest::Client::new())
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            current: RwLock::new(None),
        }
    }

    /// A page already loaded with `html`, as if fetched from `url`.
    pub fn from_html(url: &str, html: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            current: RwLock::new(Some(LoadedPage {
                url: url.to_string(),
                html: html.to_string(),
            })),
        }
    }

    async fn loaded<T>(&self, f: impl FnOnce(&LoadedPage) -> T) -> Result<T> {
        let current = self.current.read().await;
        current
            .as_ref()
            .map(f)
            .ok_or_else(|| Error::Browser("no page loaded".to_string()))
    }
}

impl Default for StaticPage {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| Error::Scraping(format!("Invalid selector {:?}: {:?}", selector, e)))
}

/// Elements that start and end on their own line when rendered.
const BLOCK_ELEMENTS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li",
    "main", "nav", "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

const HIDDEN_ELEMENTS: &[&str] = &["head", "noscript", "script", "style", "template"];

fn push_rendered_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.extend(text.chars().map(|c| if c.is_ascii_whitespace() { ' ' } else { c }));
            continue;
        }
        let Some(child) = ElementRef::wrap(child) else {
            continue;
        };
        let name = child.value().name();
        if name == "br" {
            out.push('\n');
        } else if HIDDEN_ELEMENTS.contains(&name) {
            continue;
        } else if BLOCK_ELEMENTS.contains(&name) {
            out.push('\n');
            push_rendered_text(child, out);
            out.push('\n');
        } else {
            push_rendered_text(child, out);
        }
    }
}

/// Text as a browser renders it: source whitespace collapses to single
/// spaces, `<br>` and block boundaries become line breaks.
fn visible_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    push_rendered_text(element, &mut raw);
    raw.split('\n')
        .map(|line| line.split(' ').filter(|w| !w.is_empty()).collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn to_node(element: ElementRef<'_>) -> Node {
    Node {
        text: visible_text(element),
        attributes: element
            .value()
            .attrs()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
    }
}

fn select_nodes(html: &str, locator: &Locator) -> Result<Vec<Node>> {
    let document = Html::parse_document(html);
    let (last, scopes) = locator
        .steps()
        .split_last()
        .ok_or_else(|| Error::Scraping("empty locator".to_string()))?;

    let mut scope = document.root_element();
    for step in scopes {
        let selector = parse_selector(step)?;
        scope = scope
            .select(&selector)
            .next()
            .ok_or_else(|| Error::ElementNotFound(locator.to_string()))?;
    }

    let selector = parse_selector(last)?;
    Ok(scope.select(&selector).map(to_node).collect())
}

fn to_mhtml(url: &str, html: &str) -> String {
    format!(
        "From: <Saved by ws_scrapers>\r\n\
         Snapshot-Content-Location: {url}\r\n\
         Date: {date}\r\n\
         MIME-Version: 1.0\r\n\
         Content-Type: multipart/related;\r\n\ttype=\"text/html\";\r\n\tboundary=\"{boundary}\"\r\n\
         \r\n\
         --{boundary}\r\n\
         Content-Type: text/html\r\n\
         Content-Transfer-Encoding: binary\r\n\
         Content-Location: {url}\r\n\
         \r\n\
         {html}\r\n\
         --{boundary}--\r\n",
        url = url,
        date = Utc::now().to_rfc2822(),
        boundary = MHTML_BOUNDARY,
        html = html,
    )
}

#[async_trait]
impl PageDriver for StaticPage {
    async fn goto(&self, url: &str) -> Result<()> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let final_url = response.url().to_string();
        let html = response.text().await?;
        tracing::debug!("Loaded {} ({} bytes)", final_url, html.len());
        *self.current.write().await = Some(LoadedPage { url: final_url, html });
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        self.loaded(|page| page.url.clone()).await
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<Node>> {
        let html = self.loaded(|page| page.html.clone()).await?;
        select_nodes(&html, locator)
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        Ok(())
    }

    async fn capture_snapshot(&self) -> Result<String> {
        self.loaded(|page| to_mhtml(&page.url, &page.html)).await
    }
}
