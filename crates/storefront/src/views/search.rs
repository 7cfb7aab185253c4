use crate::api::query::DEFAULT_PAGE_SIZE;
use crate::api::{BusinessTypeFilter, SearchQuery, SearchType};
use crate::outcome::Route;

/// Header search box: type toggle, optional business-type filter, and
/// navigation to the results route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchBar {
    search_type: Option<SearchType>,
    pub query: String,
    business_type: BusinessTypeFilter,
    page_size: u32,
}

impl Default for SearchBar {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl SearchBar {
    pub fn new(page_size: u32) -> Self {
        Self {
            search_type: Some(SearchType::User),
            query: String::new(),
            business_type: BusinessTypeFilter::Any,
            page_size,
        }
    }

    pub fn search_type(&self) -> Option<SearchType> {
        self.search_type
    }

    pub fn change_search_type(&mut self, search_type: Option<SearchType>) {
        self.search_type = search_type;
    }

    pub fn placeholder(&self) -> &'static str {
        self.search_type.map(SearchType::placeholder).unwrap_or("")
    }

    pub fn shows_business_type(&self) -> bool {
        self.search_type == Some(SearchType::Business)
    }

    pub fn business_type(&self) -> BusinessTypeFilter {
        self.business_type
    }

    pub fn select_business_type(&mut self, filter: BusinessTypeFilter) {
        self.business_type = filter;
    }

    pub fn to_query(&self) -> Option<SearchQuery> {
        let query = match self.search_type? {
            SearchType::User => SearchQuery::users(&self.query),
            SearchType::Business => SearchQuery::businesses(&self.query, self.business_type),
        };
        Some(query.with_page_size(self.page_size))
    }

    /// Where pressing enter goes. Nothing when no type is chosen or the
    /// results for this exact search are already on screen.
    pub fn search(&self, current_route: &str) -> Option<Route> {
        let route = self.to_query()?.route();
        if route == current_route {
            return None;
        }
        tracing::debug!(%route, "search");
        Some(Route::Search(route))
    }
}
