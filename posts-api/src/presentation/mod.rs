use std::sync::Arc;

use crate::application::blog_service::BlogService;

pub(crate) mod http;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) blog_service: Arc<BlogService>,
}

impl AppState {
    pub(crate) fn new(blog_service: Arc<BlogService>) -> Self {
        Self { blog_service }
    }
}
