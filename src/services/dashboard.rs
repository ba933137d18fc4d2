use crate::{
    config::dashboard::{DashboardConfig, RefreshMode},
    error::AppResult,
    models::{Report, ReportStatus},
    services::report_store::{ReportStore, REPORTS_KEY},
    storage::{ChangeFeed, StorageEvent},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use utoipa::ToSchema;

/// Status filter applied to the dashboard listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    #[default]
    All,
    New,
    InProgress,
    Resolved,
}

impl Tab {
    pub fn admits(&self, status: ReportStatus) -> bool {
        match self {
            Tab::All => true,
            Tab::New => status == ReportStatus::New,
            Tab::InProgress => status == ReportStatus::InProgress,
            Tab::Resolved => status == ReportStatus::Resolved,
        }
    }
}

impl FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Tab::All),
            "new" => Ok(Tab::New),
            "in_progress" => Ok(Tab::InProgress),
            "resolved" => Ok(Tab::Resolved),
            other => Err(format!(
                "tab must be one of: all, new, in_progress, resolved (got '{}')",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total: usize,
    pub new: usize,
    pub in_progress: usize,
    pub resolved: usize,
    /// Report count per category label
    pub types: BTreeMap<String, usize>,
}

impl DashboardStats {
    pub fn from_reports(reports: &[Report]) -> Self {
        let mut stats = Self {
            total: reports.len(),
            ..Self::default()
        };
        for report in reports {
            match report.status {
                ReportStatus::New => stats.new += 1,
                ReportStatus::InProgress => stats.in_progress += 1,
                ReportStatus::Resolved => stats.resolved += 1,
            }
            *stats.types.entry(report.kind.clone()).or_default() += 1;
        }
        stats
    }
}

/// What a mounted dashboard renders.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardView {
    pub tab: Tab,
    pub reports: Vec<Report>,
    pub stats: DashboardStats,
}

/// In-memory dashboard state over a [`ReportStore`].
///
/// The view is only as fresh as the last [`Dashboard::refresh`]. Mutations
/// go to the store first and are then mirrored locally.
pub struct Dashboard {
    store: ReportStore,
    reports: Vec<Report>,
    tab: Tab,
}

impl Dashboard {
    pub fn mount(store: ReportStore) -> AppResult<Self> {
        let reports = store.load_all()?;
        Ok(Self {
            store,
            reports,
            tab: Tab::All,
        })
    }

    pub fn refresh(&mut self) -> AppResult<()> {
        self.reports = self.store.load_all()?;
        Ok(())
    }

    pub fn tab(&self) -> Tab {
        self.tab
    }

    pub fn set_tab(&mut self, tab: Tab) {
        self.tab = tab;
    }

    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    pub fn visible(&self) -> impl Iterator<Item = &Report> + '_ {
        let tab = self.tab;
        self.reports.iter().filter(move |r| tab.admits(r.status))
    }

    pub fn stats(&self) -> DashboardStats {
        DashboardStats::from_reports(&self.reports)
    }

    pub fn view(&self) -> DashboardView {
        DashboardView {
            tab: self.tab,
            reports: self.visible().cloned().collect(),
            stats: self.stats(),
        }
    }

    /// Returns whether the store held a report with `id`.
    pub fn set_status(&mut self, id: &str, status: ReportStatus) -> AppResult<bool> {
        let found = self.store.update_status(id, status).inspect_err(|e| {
            tracing::error!("Error updating report {} status: {}", id, e);
        })?;
        if found {
            for report in self.reports.iter_mut().filter(|r| r.id == id) {
                report.status = status;
            }
        }
        Ok(found)
    }

    /// Returns whether the store held a report with `id`.
    pub fn delete(&mut self, id: &str) -> AppResult<bool> {
        let found = self.store.remove(id).inspect_err(|e| {
            tracing::error!("Error deleting report {}: {}", id, e);
        })?;
        if found {
            self.reports.retain(|r| r.id != id);
        }
        Ok(found)
    }
}

/// Refresh settings shared by every mounted dashboard.
#[derive(Clone)]
pub struct DashboardFeed {
    config: DashboardConfig,
    changes: ChangeFeed,
}

impl DashboardFeed {
    pub fn new(config: DashboardConfig, changes: ChangeFeed) -> Self {
        Self { config, changes }
    }

    pub fn source(&self) -> RefreshSource {
        RefreshSource::from_config(&self.config, &self.changes)
    }
}

/// Decides when a mounted dashboard reloads.
pub enum RefreshSource {
    Poll(Interval),
    Notify(broadcast::Receiver<StorageEvent>),
}

impl RefreshSource {
    /// First tick fires one `period` from now; the mount already loaded.
    pub fn poll(period: Duration) -> Self {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self::Poll(interval)
    }

    pub fn notify(feed: &ChangeFeed) -> Self {
        Self::Notify(feed.subscribe())
    }

    pub fn from_config(config: &DashboardConfig, feed: &ChangeFeed) -> Self {
        match config.refresh {
            RefreshMode::Poll => Self::poll(config.poll_interval),
            RefreshMode::Notify => Self::notify(feed),
        }
    }

    /// Wait until the dashboard should reload. Returns `false` once no
    /// further refresh can ever be signalled.
    pub async fn changed(&mut self) -> bool {
        match self {
            Self::Poll(interval) => {
                interval.tick().await;
                true
            }
            Self::Notify(rx) => loop {
                match rx.recv().await {
                    Ok(event) if event.key == REPORTS_KEY => return true,
                    Ok(_) => continue,
                    // Missed events may have touched reports.
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!("Dashboard feed lagged by {} events", skipped);
                        return true;
                    }
                    Err(RecvError::Closed) => return false,
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KeyValueStore, MemoryStore, NotifyingStore};
    use std::sync::Arc;

    fn report(id: &str, created_at: &str, kind: &str, status: ReportStatus) -> Report {
        Report {
            id: id.to_string(),
            image: Some("data:image/png;base64,iVBORw==".to_string()),
            audio: None,
            kind: kind.to_string(),
            location: None,
            created_at: created_at.to_string(),
            status,
        }
    }

    fn seeded() -> ReportStore {
        let store = ReportStore::new(Arc::new(MemoryStore::new()));
        store
            .append(report("1", "2024-01-01T00:00:00Z", "طرق", ReportStatus::New))
            .unwrap();
        store
            .append(report("2", "2024-01-02T00:00:00Z", "ماء", ReportStatus::InProgress))
            .unwrap();
        store
            .append(report("3", "2024-01-03T00:00:00Z", "طرق", ReportStatus::Resolved))
            .unwrap();
        store
    }

    fn visible_ids(dashboard: &Dashboard) -> Vec<String> {
        dashboard.visible().map(|r| r.id.clone()).collect()
    }

    #[test]
    fn tabs_filter_by_status() {
        let mut dashboard = Dashboard::mount(seeded()).unwrap();
        assert_eq!(visible_ids(&dashboard), vec!["3", "2", "1"]);

        dashboard.set_tab(Tab::New);
        assert_eq!(visible_ids(&dashboard), vec!["1"]);
        dashboard.set_tab(Tab::InProgress);
        assert_eq!(visible_ids(&dashboard), vec!["2"]);
        dashboard.set_tab(Tab::Resolved);
        assert_eq!(visible_ids(&dashboard), vec!["3"]);
    }

    #[test]
    fn stats_count_statuses_and_types() {
        let dashboard = Dashboard::mount(seeded()).unwrap();
        let stats = dashboard.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.new, 1);
        assert_eq!(stats.in_progress, 1);
        assert_eq!(stats.resolved, 1);
        assert_eq!(stats.types.get("طرق"), Some(&2));
        assert_eq!(stats.types.get("ماء"), Some(&1));
    }

    #[test]
    fn stats_ignore_active_tab() {
        let mut dashboard = Dashboard::mount(seeded()).unwrap();
        dashboard.set_tab(Tab::Resolved);
        assert_eq!(dashboard.stats().total, 3);
        assert_eq!(dashboard.view().reports.len(), 1);
    }

    #[test]
    fn resolving_moves_report_between_tabs() {
        let store = ReportStore::new(Arc::new(MemoryStore::new()));
        store
            .append(report("1", "2024-01-01T00:00:00Z", "", ReportStatus::New))
            .unwrap();
        let mut dashboard = Dashboard::mount(store.clone()).unwrap();

        assert!(dashboard.set_status("1", ReportStatus::Resolved).unwrap());
        dashboard.refresh().unwrap();

        dashboard.set_tab(Tab::Resolved);
        assert_eq!(visible_ids(&dashboard), vec!["1"]);
        dashboard.set_tab(Tab::New);
        assert!(visible_ids(&dashboard).is_empty());
        assert_eq!(store.find("1").unwrap().unwrap().status, ReportStatus::Resolved);
    }

    #[test]
    fn mutations_mirror_store_without_refresh() {
        let store = seeded();
        let mut dashboard = Dashboard::mount(store.clone()).unwrap();

        dashboard.set_status("2", ReportStatus::Resolved).unwrap();
        assert_eq!(dashboard.stats().resolved, 2);

        assert!(dashboard.delete("1").unwrap());
        assert_eq!(dashboard.reports().len(), 2);
        assert_eq!(store.load_all().unwrap().len(), 2);

        assert!(!dashboard.delete("1").unwrap());
    }

    #[test]
    fn missing_report_leaves_view_untouched() {
        let store = seeded();
        let mut dashboard = Dashboard::mount(store.clone()).unwrap();
        store.remove("1").unwrap();

        assert!(!dashboard.set_status("1", ReportStatus::Resolved).unwrap());
        assert_eq!(dashboard.stats().resolved, 1);
        assert_eq!(dashboard.stats().new, 1);
        assert!(store.find("1").unwrap().is_none());
    }

    #[test]
    fn stored_reports_without_ids_are_manageable() {
        let kv = Arc::new(MemoryStore::new());
        kv.set(
            REPORTS_KEY,
            br#"[{"created_at":"2024-02-01T00:00:00Z"},{"created_at":"2024-02-02T00:00:00Z"}]"#,
        )
        .unwrap();
        let store = ReportStore::new(kv);
        let mut dashboard = Dashboard::mount(store.clone()).unwrap();
        let ids: Vec<String> = dashboard.reports().iter().map(|r| r.id.clone()).collect();
        assert_ne!(ids[0], ids[1]);

        assert!(dashboard.set_status(&ids[1], ReportStatus::Resolved).unwrap());
        dashboard.refresh().unwrap();
        assert_eq!(dashboard.stats().resolved, 1);

        assert!(dashboard.delete(&ids[0]).unwrap());
        dashboard.refresh().unwrap();
        assert_eq!(visible_ids(&dashboard), vec![ids[1].as_str()]);
    }

    #[test]
    fn view_is_stale_until_refresh() {
        let store = seeded();
        let mut dashboard = Dashboard::mount(store.clone()).unwrap();
        store
            .append(report("4", "2024-01-04T00:00:00Z", "", ReportStatus::New))
            .unwrap();

        assert_eq!(dashboard.reports().len(), 3);
        dashboard.refresh().unwrap();
        assert_eq!(dashboard.reports()[0].id, "4");
    }

    #[test]
    fn tab_parsing() {
        assert_eq!("in_progress".parse::<Tab>(), Ok(Tab::InProgress));
        assert!("closed".parse::<Tab>().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn poll_source_ticks_every_period() {
        let period = Duration::from_secs(5);
        let mut source = RefreshSource::poll(period);
        let started = Instant::now();

        assert!(source.changed().await);
        let first = started.elapsed();
        assert!(first >= period && first < period + Duration::from_millis(10));

        assert!(source.changed().await);
        let second = started.elapsed();
        assert!(second >= period * 2 && second < period * 2 + Duration::from_millis(10));
    }

    #[tokio::test]
    async fn notify_source_wakes_on_report_writes_only() {
        let kv = NotifyingStore::new(MemoryStore::new());
        let mut source = RefreshSource::notify(&kv.feed());

        kv.set("adminUser", b"{}").unwrap();
        kv.set(REPORTS_KEY, b"[]").unwrap();
        assert!(source.changed().await);

        kv.remove("adminUser").unwrap();
        let pending =
            tokio::time::timeout(Duration::from_millis(50), source.changed()).await;
        assert!(pending.is_err());
    }

    #[tokio::test]
    async fn notify_source_ends_when_store_dropped() {
        let kv = NotifyingStore::new(MemoryStore::new());
        let mut source = RefreshSource::notify(&kv.feed());
        drop(kv);
        assert!(!source.changed().await);
    }
}
