use uuid::Uuid;

use kalita_types::api::default_limit;
use kalita_types::models::{News, NewsCategory, NewsDetail};

use crate::client::KalitaClient;
use crate::state::FetchState;

/// News list and category list behind the news pages.
pub struct NewsFeed {
    client: KalitaClient,
    pub news: Vec<News>,
    pub categories: Vec<NewsCategory>,
    pub state: FetchState,
}

impl NewsFeed {
    pub fn new(client: KalitaClient) -> Self {
        Self {
            client,
            news: Vec::new(),
            categories: Vec::new(),
            state: FetchState::default(),
        }
    }

    /// First page of published news, then the categories.
    pub async fn mount(&mut self) {
        self.state.clear_error();
        self.fetch_news(default_limit(), 0).await;
        self.fetch_categories().await;
    }

    pub async fn refetch(&mut self) {
        self.mount().await;
    }

    pub async fn fetch_news(&mut self, limit: u32, offset: u32) {
        self.state.begin();
        let result = self.client.published_news(limit, offset).await;
        if let Some(news) = self.state.finish(result) {
            self.news = news;
        }
    }

    pub async fn fetch_categories(&mut self) {
        let result = self.client.categories().await;
        if let Some(categories) = self.state.record(result) {
            self.categories = categories;
        }
    }

    /// Returned to the caller rather than stored; empty on failure.
    pub async fn fetch_important_news(&mut self) -> Vec<News> {
        let result = self.client.important_news().await;
        self.state.record(result).unwrap_or_default()
    }

    pub async fn fetch_news_by_category(&mut self, category_id: Uuid, limit: u32) {
        self.state.begin();
        let result = self.client.news_by_category(category_id, limit).await;
        if let Some(news) = self.state.finish(result) {
            self.news = news;
        }
    }

    pub fn loading(&self) -> bool {
        self.state.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }
}

/// One news item with its comments.
pub struct NewsDetailView {
    client: KalitaClient,
    news_id: Uuid,
    pub news: Option<NewsDetail>,
    pub state: FetchState,
}

impl NewsDetailView {
    pub fn new(client: KalitaClient, news_id: Uuid) -> Self {
        Self {
            client,
            news_id,
            news: None,
            state: FetchState::default(),
        }
    }

    pub fn news_id(&self) -> Uuid {
        self.news_id
    }

    pub async fn mount(&mut self) {
        self.state.clear_error();
        self.state.begin();
        let result = self.client.news_detail(self.news_id).await;
        if let Some(detail) = self.state.finish(result) {
            self.news = Some(detail);
        }
    }

    pub async fn refetch(&mut self) {
        self.mount().await;
    }

    /// Post a comment and reload so the thread and count stay in step.
    pub async fn add_comment(&mut self, content: &str) -> bool {
        let result = self.client.add_comment(self.news_id, content).await;
        let posted = self.state.record(result).is_some();
        if posted {
            self.mount().await;
        }
        posted
    }
}
