//! Built-in tools that models can use.

mod internet_search;

pub use internet_search::{
    INTERNET_SEARCH_USAGE, InternetSearchParameters, InternetSearchTool,
};
