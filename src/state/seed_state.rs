/// Per-seed crawl state machine
///
/// Every seed walks `Seeded -> FetchingHomepage -> FetchingSubpages -> Done`.
/// `FetchingSubpages` is skipped when the homepage yields nothing to follow.
use crate::CrawlerError;
use std::fmt;

/// Represents where one seed's traversal currently stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeedState {
    /// Seed loaded and normalized, homepage not yet requested
    Seeded,

    /// Homepage request is in flight
    FetchingHomepage,

    /// At least one discovered sub-page request is outstanding
    FetchingSubpages,

    /// No requests outstanding; the traversal is over
    Done,
}

impl SeedState {
    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Returns true if moving to `next` is a legal transition
    pub fn can_transition_to(&self, next: SeedState) -> bool {
        matches!(
            (self, next),
            (Self::Seeded, Self::FetchingHomepage)
                | (Self::Seeded, Self::Done)
                | (Self::FetchingHomepage, Self::FetchingSubpages)
                | (Self::FetchingHomepage, Self::Done)
                | (Self::FetchingSubpages, Self::Done)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seeded => "seeded",
            Self::FetchingHomepage => "fetching_homepage",
            Self::FetchingSubpages => "fetching_subpages",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for SeedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Bookkeeping for one seed's traversal
#[derive(Debug, Clone)]
pub struct SeedProgress {
    pub homepage_id: String,
    pub state: SeedState,

    /// Requests scheduled for this seed that have not completed yet
    pub pending: usize,

    /// Textual pages processed (homepage included)
    pub pages_fetched: usize,

    /// Sub-pages handed to the archiver
    pub pages_archived: usize,
}

impl SeedProgress {
    pub fn new(homepage_id: impl Into<String>) -> Self {
        Self {
            homepage_id: homepage_id.into(),
            state: SeedState::Seeded,
            pending: 0,
            pages_fetched: 0,
            pages_archived: 0,
        }
    }

    /// Moves to `next`, rejecting illegal transitions
    pub fn transition(&mut self, next: SeedState) -> Result<(), CrawlerError> {
        if !self.state.can_transition_to(next) {
            return Err(CrawlerError::InvalidTransition {
                homepage: self.homepage_id.clone(),
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        Ok(())
    }

    /// Records that a request for this seed was scheduled
    pub fn request_scheduled(&mut self) -> Result<(), CrawlerError> {
        if self.state == SeedState::Seeded {
            self.transition(SeedState::FetchingHomepage)?;
        }
        self.pending += 1;
        Ok(())
    }

    /// Records that a request for this seed completed, whatever its outcome
    ///
    /// Follow-ups discovered on the completed page must be scheduled first,
    /// otherwise the seed is declared done too early.
    pub fn request_finished(&mut self) -> Result<(), CrawlerError> {
        self.pending = self.pending.saturating_sub(1);

        match (self.state, self.pending) {
            (SeedState::FetchingHomepage, 0) | (SeedState::FetchingSubpages, 0) => {
                self.transition(SeedState::Done)
            }
            (SeedState::FetchingHomepage, _) => self.transition(SeedState::FetchingSubpages),
            _ => Ok(()),
        }
    }
}
