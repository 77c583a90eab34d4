//! Turns a day's intensity into a batch of commits against the working
//! copy, interleaved with periodic pushes and pacing pauses.

use crate::config::CanvasConfig;
use crate::lifecycle::RepoManager;
use crate::pacing::PacingPolicy;
use chrono::{Local, NaiveDate};
use pattern::{GlyphBoard, Intensity};
use rand::Rng;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;
use vcs::{CommitStamp, PushMode, VcsClient};

/// Push every k-th commit of a live batch.
const LIVE_PUSH_CADENCE: u32 = 3;
/// Push cadence for backdated batches.
const BACKFILL_PUSH_CADENCE: u32 = 5;

/// Hour-of-day range for backdated commit stamps.
const BACKDATE_HOURS: std::ops::RangeInclusive<u32> = 9..=18;

pub struct CommitDriver {
    config: Arc<CanvasConfig>,
    client: Arc<dyn VcsClient>,
    repo: RepoManager,
    board: GlyphBoard,
    pacing: PacingPolicy,
    run_id: Uuid,
}

impl CommitDriver {
    pub fn new(config: Arc<CanvasConfig>, client: Arc<dyn VcsClient>) -> Self {
        let repo = RepoManager::new(config.clone(), client.clone());
        let board = GlyphBoard::builtin(config.gap_weeks);
        let pacing = PacingPolicy::from(&config.pacing);
        Self {
            repo,
            board,
            pacing,
            run_id: Uuid::new_v4(),
            config,
            client,
        }
    }

    /// Replace the pacing policy; tests disable it.
    pub fn with_pacing(mut self, pacing: PacingPolicy) -> Self {
        self.pacing = pacing;
        self
    }

    pub fn repo(&self) -> &RepoManager {
        &self.repo
    }

    pub fn board(&self) -> &GlyphBoard {
        &self.board
    }

    /// Create today's commits from the pattern.
    pub async fn daily(&self) -> bool {
        self.run_for_date(Local::now().date_naive()).await
    }

    /// One day's live update: map the date to an intensity, then commit and
    /// push accordingly. An intensity of zero is a successful no-op.
    pub async fn run_for_date(&self, date: NaiveDate) -> bool {
        if !self.repo.ensure_local_copy().await {
            error!("repository setup failed");
            return false;
        }

        let intensity = self.board.intensity_for(date);
        if intensity == Intensity::None {
            info!(%date, "no commits needed for this date according to the pattern");
            return true;
        }

        let count = intensity.sample_commits(&mut rand::thread_rng());
        info!(%date, level = intensity.level(), count, "creating commits");

        let branch = self.repo.current_branch().await;
        self.repo.sync().await;

        self.commit_batch(count, None, LIVE_PUSH_CADENCE, false).await;

        // Final push so nothing from this batch is left behind.
        self.repo.push_with_recovery(&branch).await;
        info!(%date, "daily update completed");
        true
    }

    /// Recreate the pattern from `start` through today with backdated
    /// commits. `force` permits a blind force push when even the
    /// lease-guarded push is refused.
    pub async fn backfill(&self, start: NaiveDate, force: bool) -> bool {
        if !self.repo.ensure_local_copy().await {
            error!("repository setup failed");
            return false;
        }

        let today = Local::now().date_naive();
        info!(%start, %today, "creating initial pattern");
        let branch = self.repo.current_branch().await;

        let mut date = start;
        let mut rng = rand::thread_rng();
        while date <= today {
            let intensity = self.board.intensity_for(date);
            if intensity != Intensity::None {
                let count = intensity.sample_commits(&mut rng);
                info!(%date, count, "creating backdated commits");
                self.commit_batch(count, Some(date), BACKFILL_PUSH_CADENCE, force)
                    .await;
            }
            date += chrono::Duration::days(1);
        }

        if !self.repo.push_with_recovery(&branch).await && force {
            warn!("final push failed, attempting force push");
            if let Err(err) = self
                .client
                .push(&self.config.remote.local_path, "origin", &branch, PushMode::Force)
                .await
            {
                error!(%err, "force push failed");
            }
        }

        info!("initial setup completed");
        true
    }

    /// Run `count` modify/stage/commit cycles against the file pool,
    /// pushing every `cadence`-th commit and always on the last one. A
    /// failed step is logged and the loop moves to the next index.
    pub async fn commit_batch(
        &self,
        count: u32,
        backdate: Option<NaiveDate>,
        cadence: u32,
        force: bool,
    ) -> bool {
        if count == 0 {
            return true;
        }

        let path = &self.config.remote.local_path;
        let branch = self.repo.current_branch().await;
        let day = backdate.unwrap_or_else(|| Local::now().date_naive());
        let timestamp = Local::now().format("%Y%m%d%H%M%S").to_string();

        for index in 0..count {
            let name = self.config.pool_file(index as usize);
            let marker = format!(
                "canvas mark {day} {timestamp} run {} commit {index}\n",
                self.run_id
            );
            if let Err(err) = std::fs::write(path.join(&name), marker) {
                warn!(%err, file = %name, "failed to write pool file");
                continue;
            }

            if let Err(err) = self.client.stage(path, &name).await {
                warn!(%err, file = %name, "failed to stage pool file");
                continue;
            }

            let (message, stamp) = match backdate {
                Some(date) => {
                    let hour = rand::thread_rng().gen_range(BACKDATE_HOURS);
                    (
                        format!("canvas: backfill {date} [{index}]"),
                        date.and_hms_opt(hour, 0, 0).map(CommitStamp::new),
                    )
                }
                None => (format!("canvas: paint {day} [{index}]"), None),
            };

            if let Err(err) = self.client.commit(path, &message, stamp.as_ref()).await {
                warn!(%err, index, "failed to commit");
                continue;
            }

            if index % cadence == 0 || index == count - 1 {
                if !self.repo.push_with_recovery(&branch).await {
                    error!(index, "failed to push commit batch");
                    if force {
                        warn!("attempting force push");
                        if let Err(err) = self
                            .client
                            .push(path, "origin", &branch, PushMode::Force)
                            .await
                        {
                            error!(%err, "force push failed");
                        }
                    } else if backdate.is_none() {
                        // Live runs resync and keep going.
                        self.repo.sync().await;
                    }
                }
            }

            self.pacing.pause().await;
        }

        true
    }
}
