use ws_core::text::sanitize_str;
use ws_core::{Categories, Locator, PageDriver, Result, Timeouts};
use crate::scrapers::utils::{any_link, resolve_href};

/// Reads the category menu of the site root.
///
/// Duplicate labels keep the last URL seen.
pub async fn fetch_categories(
    driver: &dyn PageDriver,
    root_url: &str,
    menu: &Locator,
    timeouts: &Timeouts,
) -> Result<Categories> {
    driver.goto(root_url).await?;
    driver.wait_for(&any_link(), timeouts.links).await?;

    let page_url = driver.current_url().await?;
    let mut categories = Categories::new();
    for link in driver.find_all(menu).await? {
        let Some(href) = link.attribute("href") else {
            tracing::debug!("Menu entry {:?} has no href", link.text());
            continue;
        };
        categories.insert(sanitize_str(link.text()), resolve_href(&page_url, href)?);
    }

    tracing::info!("🗂️ Found {} categories at {}", categories.len(), root_url);
    Ok(categories)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::StaticPage;
    use mockito::Server;
    use std::time::Duration;
    use ws_core::Error;

    fn menu() -> Locator {
        Locator::css("nav").within(".sf-menu").within("a")
    }

    fn quick() -> Timeouts {
        Timeouts {
            links: Duration::from_millis(100),
            ..Timeouts::default()
        }
    }

    #[tokio::test]
    async fn test_fetch_categories() {
        let mut server = Server::new_async().await;
        let _root = server
            .mock("GET", "/")
            .with_status(200)
            .with_body(
                r#"<nav class="main"><ul class="sf-menu">
                    <li><a href="/world/">World</a></li>
                    <li><a href="https://other.org/africa/"> Africa </a></li>
                    <li><a>No link</a></li>
                    <li><a href="/world-news/">World</a></li>
                </ul></nav>
                <footer><a href="/about/">About</a></footer>"#,
            )
            .create_async()
            .await;

        let driver = StaticPage::new();
        let root = format!("{}/", server.url());
        let categories = fetch_categories(&driver, &root, &menu(), &quick()).await.unwrap();

        assert_eq!(categories.len(), 2);
        assert_eq!(
            categories.get("World"),
            Some(format!("{}/world-news/", server.url()).as_str())
        );
        assert_eq!(categories.get("Africa"), Some("https://other.org/africa/"));
        assert!(categories.get("About").is_none());
    }

    #[tokio::test]
    async fn test_page_without_links_times_out() {
        let mut server = Server::new_async().await;
        let _root = server
            .mock("GET", "/")
            .with_status(200)
            .with_body("<p>Loading…</p>")
            .create_async()
            .await;

        let driver = StaticPage::new();
        let result = fetch_categories(&driver, &format!("{}/", server.url()), &menu(), &quick()).await;
        assert!(matches!(result, Err(Error::Timeout(_))));
    }
}
