//! Firefox and WebKit backends driven over WebDriver.

pub mod backend;
pub mod cog;
pub mod webdriver;
