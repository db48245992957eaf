//! Bookkeeping of which blocks still have work pending for each downstream consumer.
//!
//! Mutations are serialized on a background worker that owns the sets. Handing a job to the worker waits for the previous job
//! to finish, then returns without waiting for the new one, so callers never block on their own mutation. Reads and clears go
//! through the same queue, which makes every observation consistent with the order in which operations were issued.

use crate::config::TrackerConfig;

use gneiss_core::{BlockIndex, SmallKeyHashSet, WorkerError};
use crossbeam::channel::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

/// Selects one of the pending-update sets.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BlocksToUpdateType {
    /// Distance-field update.
    Esdf,
    /// Remeshing.
    Mesh,
    /// Freespace classification.
    Freespace,
    /// Network streaming.
    LayerStreamer,
}

impl BlocksToUpdateType {
    pub const ALL: [Self; 4] = [Self::Esdf, Self::Mesh, Self::Freespace, Self::LayerStreamer];

    /// Converts a raw selector from a collaborator. An unknown selector is a programming error and aborts the process.
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Esdf,
            1 => Self::Mesh,
            2 => Self::Freespace,
            3 => Self::LayerStreamer,
            _ => {
                log::error!("Unknown blocks-to-update type {}", raw);
                std::process::abort()
            }
        }
    }

    pub const fn as_raw(self) -> u8 {
        self as u8
    }
}

enum TrackerJob {
    Add(Vec<BlockIndex>),
    Remove(Vec<BlockIndex>),
    MarkUpdated(BlocksToUpdateType),
    Snapshot(BlocksToUpdateType, Sender<Vec<BlockIndex>>),
}

/// Tracks pending block updates for the distance-field, mesh, freespace and layer-streamer consumers.
pub struct BlocksToUpdateTracker {
    config: TrackerConfig,
    jobs: Option<Sender<TrackerJob>>,
    worker: Option<JoinHandle<()>>,
}

impl BlocksToUpdateTracker {
    pub fn new(config: TrackerConfig) -> Result<Self, WorkerError> {
        // Zero capacity: a send completes only when the worker is idle and takes the job.
        let (jobs_tx, jobs_rx) = channel::bounded(0);
        let worker = thread::Builder::new()
            .name("gneiss-blocks-to-update".into())
            .spawn(move || PendingSets::new(config).serve(jobs_rx))?;

        Ok(Self {
            config,
            jobs: Some(jobs_tx),
            worker: Some(worker),
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Marks `blocks` as pending for every consumer. The freespace set is only fed when the layer type has freespace.
    pub fn add_blocks_to_update(&self, blocks: &[BlockIndex]) {
        self.submit(TrackerJob::Add(blocks.to_vec()));
    }

    /// Forgets `blocks` in every set.
    pub fn remove_blocks_to_update(&self, blocks: &[BlockIndex]) {
        self.submit(TrackerJob::Remove(blocks.to_vec()));
    }

    /// Clears exactly the set selected by `which`.
    pub fn mark_blocks_as_updated(&self, which: BlocksToUpdateType) {
        self.submit(TrackerJob::MarkUpdated(which));
    }

    /// A snapshot of the set selected by `which`, reflecting every operation issued before this call. Order is unspecified.
    pub fn get_blocks_to_update(&self, which: BlocksToUpdateType) -> Vec<BlockIndex> {
        let (reply_tx, reply_rx) = channel::bounded(1);
        if !self.submit(TrackerJob::Snapshot(which, reply_tx)) {
            return Vec::new();
        }
        reply_rx.recv().unwrap_or_else(|_| {
            log::error!("Blocks-to-update worker dropped a {:?} snapshot", which);
            Vec::new()
        })
    }

    fn submit(&self, job: TrackerJob) -> bool {
        let sent = self.jobs.as_ref().map_or(false, |jobs| jobs.send(job).is_ok());
        if !sent {
            log::error!("Blocks-to-update worker is gone; dropping job");
        }
        sent
    }
}

impl Drop for BlocksToUpdateTracker {
    fn drop(&mut self) {
        // Disconnecting the queue lets the worker finish its last job and exit.
        self.jobs.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::error!("Blocks-to-update worker panicked");
            }
        }
    }
}

struct PendingSets {
    config: TrackerConfig,
    esdf: SmallKeyHashSet<BlockIndex>,
    mesh: SmallKeyHashSet<BlockIndex>,
    freespace: SmallKeyHashSet<BlockIndex>,
    layer_streamer: SmallKeyHashSet<BlockIndex>,
}

impl PendingSets {
    fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            esdf: Default::default(),
            mesh: Default::default(),
            freespace: Default::default(),
            layer_streamer: Default::default(),
        }
    }

    fn serve(mut self, jobs: Receiver<TrackerJob>) {
        for job in jobs {
            match job {
                TrackerJob::Add(blocks) => self.add(&blocks),
                TrackerJob::Remove(blocks) => self.remove(&blocks),
                TrackerJob::MarkUpdated(which) => self.set_mut(which).clear(),
                TrackerJob::Snapshot(which, reply) => {
                    // The caller may have given up waiting.
                    let _ = reply.send(self.set(which).iter().copied().collect());
                }
            }
        }
    }

    fn has_freespace(&self) -> bool {
        self.config.projective_layer_type.has_freespace()
    }

    fn add(&mut self, blocks: &[BlockIndex]) {
        self.esdf.extend(blocks.iter().copied());
        self.mesh.extend(blocks.iter().copied());
        self.layer_streamer.extend(blocks.iter().copied());
        if self.has_freespace() {
            self.freespace.extend(blocks.iter().copied());
        }

        for which in BlocksToUpdateType::ALL {
            self.enforce_soft_cap(which);
        }
    }

    fn remove(&mut self, blocks: &[BlockIndex]) {
        let has_freespace = self.has_freespace();
        for block in blocks {
            self.esdf.remove(block);
            self.mesh.remove(block);
            self.layer_streamer.remove(block);
            if has_freespace {
                self.freespace.remove(block);
            }
        }
    }

    /// Runs after each insertion rather than before it, so a single batch that overflows a set is dropped too.
    fn enforce_soft_cap(&mut self, which: BlocksToUpdateType) {
        let max = self.config.max_pending_blocks;
        let set = self.set_mut(which);
        if set.len() > max {
            log::error!(
                "{} blocks pending for {:?} exceed the limit of {}; dropping all of them",
                set.len(),
                which,
                max
            );
            set.clear();
        }
    }

    fn set(&self, which: BlocksToUpdateType) -> &SmallKeyHashSet<BlockIndex> {
        match which {
            BlocksToUpdateType::Esdf => &self.esdf,
            BlocksToUpdateType::Mesh => &self.mesh,
            BlocksToUpdateType::Freespace => &self.freespace,
            BlocksToUpdateType::LayerStreamer => &self.layer_streamer,
        }
    }

    fn set_mut(&mut self, which: BlocksToUpdateType) -> &mut SmallKeyHashSet<BlockIndex> {
        match which {
            BlocksToUpdateType::Esdf => &mut self.esdf,
            BlocksToUpdateType::Mesh => &mut self.mesh,
            BlocksToUpdateType::Freespace => &mut self.freespace,
            BlocksToUpdateType::LayerStreamer => &mut self.layer_streamer,
        }
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝

#[cfg(test)]
mod test {
    use super::*;
    use crate::ProjectiveLayerType;
    use gneiss_core::glam::IVec3;
    use std::collections::HashSet;

    fn tracker(projective_layer_type: ProjectiveLayerType) -> BlocksToUpdateTracker {
        BlocksToUpdateTracker::new(TrackerConfig {
            projective_layer_type,
            ..Default::default()
        })
        .unwrap()
    }

    fn pending(tracker: &BlocksToUpdateTracker, which: BlocksToUpdateType) -> HashSet<BlockIndex> {
        tracker.get_blocks_to_update(which).into_iter().collect()
    }

    const A: IVec3 = IVec3::new(0, 0, 0);
    const B: IVec3 = IVec3::new(1, 0, 0);
    const C: IVec3 = IVec3::new(0, -1, 2);

    #[test]
    fn operations_apply_in_issue_order() {
        let tracker = tracker(ProjectiveLayerType::Tsdf);
        tracker.add_blocks_to_update(&[A, B]);
        tracker.remove_blocks_to_update(&[A]);
        tracker.add_blocks_to_update(&[C]);

        let expected: HashSet<_> = [B, C].into_iter().collect();
        assert_eq!(pending(&tracker, BlocksToUpdateType::Mesh), expected);
        assert_eq!(pending(&tracker, BlocksToUpdateType::Esdf), expected);
        assert_eq!(pending(&tracker, BlocksToUpdateType::LayerStreamer), expected);
    }

    #[test]
    fn freespace_requires_capable_layer() {
        let without = tracker(ProjectiveLayerType::Tsdf);
        without.add_blocks_to_update(&[A, B]);
        assert!(without.get_blocks_to_update(BlocksToUpdateType::Freespace).is_empty());
        let expected: HashSet<_> = [A, B].into_iter().collect();
        for which in [
            BlocksToUpdateType::Esdf,
            BlocksToUpdateType::Mesh,
            BlocksToUpdateType::LayerStreamer,
        ] {
            assert_eq!(pending(&without, which), expected);
        }

        let with = tracker(ProjectiveLayerType::TsdfWithFreespace);
        with.add_blocks_to_update(&[A, B]);
        with.remove_blocks_to_update(&[B]);
        assert_eq!(with.get_blocks_to_update(BlocksToUpdateType::Freespace), vec![A]);
    }

    #[test]
    fn mark_updated_clears_only_its_set() {
        let tracker = tracker(ProjectiveLayerType::TsdfWithFreespace);
        tracker.add_blocks_to_update(&[A, B]);
        tracker.mark_blocks_as_updated(BlocksToUpdateType::Mesh);

        assert!(tracker.get_blocks_to_update(BlocksToUpdateType::Mesh).is_empty());
        for which in [
            BlocksToUpdateType::Esdf,
            BlocksToUpdateType::Freespace,
            BlocksToUpdateType::LayerStreamer,
        ] {
            assert_eq!(pending(&tracker, which).len(), 2);
        }
    }

    #[test]
    fn exceeding_soft_cap_clears_set() {
        let _ = env_logger::builder().is_test(true).try_init();
        let tracker = tracker(ProjectiveLayerType::Tsdf);
        assert_eq!(tracker.config().max_pending_blocks, 100_000);

        let blocks: Vec<_> = (0..100_001).map(|i| IVec3::new(i, 0, 0)).collect();
        tracker.add_blocks_to_update(&blocks);

        for which in BlocksToUpdateType::ALL {
            assert!(tracker.get_blocks_to_update(which).is_empty());
        }
    }

    #[test]
    fn soft_cap_is_inclusive() {
        let tracker = BlocksToUpdateTracker::new(TrackerConfig {
            max_pending_blocks: 2,
            ..Default::default()
        })
        .unwrap();
        tracker.add_blocks_to_update(&[A, B]);
        assert_eq!(pending(&tracker, BlocksToUpdateType::Mesh).len(), 2);
        tracker.add_blocks_to_update(&[C]);
        assert!(tracker.get_blocks_to_update(BlocksToUpdateType::Mesh).is_empty());
    }

    #[test]
    fn concurrent_adds_are_all_recorded() {
        let tracker = tracker(ProjectiveLayerType::Tsdf);
        thread::scope(|s| {
            for t in 0..4 {
                let tracker = &tracker;
                s.spawn(move || {
                    for i in 0..50 {
                        tracker.add_blocks_to_update(&[IVec3::new(t, i, 0)]);
                    }
                });
            }
        });
        assert_eq!(pending(&tracker, BlocksToUpdateType::Esdf).len(), 200);
    }

    #[test]
    fn construction_reports_worker_errors() -> Result<(), WorkerError> {
        let tracker = BlocksToUpdateTracker::new(TrackerConfig::default())?;
        tracker.add_blocks_to_update(&[A]);
        assert_eq!(tracker.get_blocks_to_update(BlocksToUpdateType::Esdf), vec![A]);
        Ok(())
    }

    #[test]
    fn raw_selectors_round_trip() {
        for which in BlocksToUpdateType::ALL {
            assert_eq!(BlocksToUpdateType::from_raw(which.as_raw()), which);
        }
    }
}
