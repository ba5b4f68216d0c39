//! In-memory movie list state and row production for a list view.

use tracing::{error, info, warn};

use crate::{
    catalog::CatalogError,
    config::DEFAULT_IMAGE_BASE_URL,
    models::{image_url, Movie},
    poster::{ImageLoader, PosterState},
};

/// Glyphs shown in place of a poster while it loads or after it failed.
pub const POSTER_PLACEHOLDER: &str = "░░░░";

/// Screen lifecycle. `Loaded` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenState {
    /// Nothing requested yet.
    Idle,
    /// Catalog fetch in flight.
    Loading,
    /// Movies received.
    Loaded,
    /// Fetch failed; the list keeps its prior contents.
    Failed,
}

/// Scrollable list collaborator driven by the presenter.
pub trait ListView {
    /// Backing data changed; the view must re-render `row_count` rows.
    fn data_changed(&mut self, row_count: usize);
}

/// Display data for one row.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieRow {
    /// Position in the list.
    pub index: usize,
    /// Movie title.
    pub title: String,
    /// Movie synopsis.
    pub overview: String,
    /// Full poster URL handed to the image loader.
    pub poster_url: String,
    /// Poster load state.
    pub poster: PosterState,
}

impl MovieRow {
    /// Short poster label: the placeholder unless the image is ready.
    pub fn poster_label(&self) -> String {
        match &self.poster {
            PosterState::Ready(poster) => {
                format!("{} {}K", poster.format, poster.size().div_ceil(1024))
            }
            PosterState::Loading | PosterState::Failed(_) => POSTER_PLACEHOLDER.to_string(),
        }
    }
}

/// Owns the append-only movie list and notifies its [`ListView`] on change.
pub struct MoviePresenter<V: ListView> {
    movies: Vec<Movie>,
    state: ScreenState,
    last_error: Option<String>,
    image_base_url: String,
    view: V,
}

impl<V: ListView> MoviePresenter<V> {
    /// Presenter with an empty list, using the default image base URL.
    pub fn new(view: V) -> Self {
        Self::with_image_base(view, DEFAULT_IMAGE_BASE_URL)
    }

    /// Presenter with an empty list and a custom image base URL.
    pub fn with_image_base(view: V, image_base_url: impl Into<String>) -> Self {
        Self {
            movies: Vec::new(),
            state: ScreenState::Idle,
            last_error: None,
            image_base_url: image_base_url.into(),
            view,
        }
    }

    /// Enter `Loading`. Only allowed once, from `Idle`.
    pub fn begin_loading(&mut self) -> bool {
        if self.state != ScreenState::Idle {
            warn!(state = ?self.state, "Ignoring load request outside idle state");
            return false;
        }
        self.state = ScreenState::Loading;
        true
    }

    /// Append a fetched batch in arrival order and refresh the view.
    ///
    /// Batches that arrive before [`begin_loading`](Self::begin_loading) are dropped.
    pub fn on_fetch_success(&mut self, new_movies: Vec<Movie>) {
        if self.state == ScreenState::Idle {
            warn!(dropped = new_movies.len(), "Ignoring fetched movies while idle");
            return;
        }
        let added = new_movies.len();
        self.movies.extend(new_movies);
        if self.state != ScreenState::Failed {
            self.state = ScreenState::Loaded;
        }
        info!(added, total = self.movies.len(), "Successfully fetched movies");
        self.view.data_changed(self.movies.len());
    }

    /// Record a failed fetch. The list and view are left untouched.
    pub fn on_fetch_failure(&mut self, err: &CatalogError) {
        error!(
            ?err,
            status = err.status().map(|status| status.as_u16()),
            "Failed to fetch movies"
        );
        self.last_error = Some(err.to_string());
        if self.state != ScreenState::Loaded {
            self.state = ScreenState::Failed;
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ScreenState {
        self.state
    }

    /// Message of the most recent failure.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// All movies in display order.
    pub fn movies(&self) -> &[Movie] {
        &self.movies
    }

    /// Movie at `index`.
    pub fn movie(&self, index: usize) -> Option<&Movie> {
        self.movies.get(index)
    }

    /// Number of rows to display.
    pub fn row_count(&self) -> usize {
        self.movies.len()
    }

    /// Poster URL for `movie` under the configured image base.
    pub fn poster_url(&self, movie: &Movie) -> String {
        image_url(&self.image_base_url, &movie.poster_path)
    }

    /// Backdrop URL for `movie` under the configured image base.
    pub fn backdrop_url(&self, movie: &Movie) -> String {
        image_url(&self.image_base_url, &movie.backdrop_path)
    }

    /// Row for `index`, requesting its poster from `images`.
    pub fn row(&self, index: usize, images: &dyn ImageLoader) -> Option<MovieRow> {
        let movie = self.movies.get(index)?;
        let poster_url = self.poster_url(movie);
        let poster = images.request(&poster_url);
        Some(MovieRow {
            index,
            title: movie.title.clone(),
            overview: movie.overview.clone(),
            poster_url,
            poster,
        })
    }

    /// The list view.
    pub fn view(&self) -> &V {
        &self.view
    }

    /// Mutable access to the list view, e.g. for scrolling.
    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }
}
