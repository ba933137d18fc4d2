pub mod auth;
pub mod dashboard;
pub mod geolocation;
pub mod report_form;
pub mod report_store;

pub use auth::AuthService;
pub use dashboard::{Dashboard, DashboardFeed, DashboardStats, DashboardView, RefreshSource, Tab};
pub use geolocation::{GeolocationError, GeolocationProvider, ReportedPosition};
pub use report_form::{ReportForm, Submission};
pub use report_store::ReportStore;
