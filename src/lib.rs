pub mod cli;
pub mod commands;
pub mod context;
pub mod detail;
pub mod display;
pub mod error;
pub mod events;
pub mod favorites;
pub mod navigator;
pub mod query;
pub mod remote;
pub mod results;
pub mod router;
pub mod scroll;
pub mod search;
pub mod types;

pub use context::{NavigationContext, NavigationState};
pub use detail::{ActionController, ActionForm, FormKind, FormState, IssueDetail};
pub use error::{NavigatorError, Result};
pub use events::{EventBus, NavigatorEvent};
pub use navigator::IssueNavigator;
pub use query::{Query, QueryPair, Separator, SortField, Sorting};
pub use remote::{Config, HttpIssueService, IssueMutation, IssueService, MergeStrategy};
pub use results::{Page, ResultSet};
pub use router::{DEFAULT_ROUTE, Route};
pub use search::{FetchOutcome, SearchState, SkipReason};
pub use types::{
    ActionPlan, AppState, Comment, FavoriteFilter, Issue, IssueStatus, Paging, Rule,
    SearchResponse, Severity, SourceSnippet, VALID_SEVERITIES,
};
