pub mod browser;
pub mod google_news;
pub mod newswhip;
pub mod storage;
pub mod talkwalker;

pub use browser::DriverSettings;
pub use google_news::GoogleNewsScraper;
pub use newswhip::NewswhipScraper;
pub use storage::LocalStorage;
pub use talkwalker::TalkwalkerScraper;
