pub mod static_page;

#[cfg(feature = "chromium")]
pub mod chromium;

pub use static_page::StaticPage;

#[cfg(feature = "chromium")]
pub use chromium::ChromiumDriver;

/// Backends selectable from the command line.
pub fn available_drivers() -> Vec<&'static str> {
    let mut names = vec!["static"];
    #[cfg(feature = "chromium")]
    names.push("chromium");
    names
}
