pub mod images;
pub mod listing;
pub mod listings;
pub mod sales;
pub mod search;

pub use images::ImageManager;
pub use listing::SaleListingView;
pub use listings::ListingsPage;
pub use sales::SalesSummary;
pub use search::SearchBar;
