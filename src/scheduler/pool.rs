//! Parallel planning of template groups.
//!
//! Each group is planned by its own `spawn_blocking` task on a dedicated tokio
//! runtime whose blocking pool is capped at `workers` threads. Every group is
//! moved into exactly one task, so planning needs no locks. Tasks are joined
//! in spawn order, which keeps results in group order.

use std::num::NonZeroUsize;
use std::thread;
use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;

use crate::domain::Message;
use crate::error::Result;
use crate::scheduler::groups::TemplateGroup;

/// Configuration for the planning worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Maximum threads planning one tier at the same time.
    pub workers: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: thread::available_parallelism().map(NonZeroUsize::get).unwrap_or(1),
        }
    }
}

impl PoolConfig {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }
}

/// Blocking pool that plans the template groups of one tier.
///
/// Owns its runtime, so it must be created and dropped outside of any async
/// context.
#[derive(Debug)]
pub struct PlanningPool {
    runtime: Runtime,
    workers: usize,
}

impl PlanningPool {
    pub fn new(config: PoolConfig) -> Result<Self> {
        let workers = config.workers.max(1);
        let runtime = Builder::new_current_thread()
            .thread_name("mailing-planner")
            .max_blocking_threads(workers)
            .build()?;
        Ok(Self { runtime, workers })
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Plan every group and return the per-group results in input order.
    ///
    /// Blocks until all groups are planned. A panic while planning a group is
    /// resumed on the calling thread.
    pub fn plan_groups(&self, groups: Vec<TemplateGroup<'_>>) -> Vec<Vec<Message>> {
        if self.workers == 1 || groups.len() <= 1 {
            return groups.into_iter().map(TemplateGroup::plan).collect();
        }

        self.runtime.block_on(async {
            let handles: Vec<JoinHandle<Vec<Message>>> = groups
                .into_iter()
                .map(|group| {
                    let template = group.template.clone();
                    let messages = group.messages;
                    tokio::task::spawn_blocking(move || {
                        TemplateGroup {
                            template: &template,
                            messages,
                        }
                        .plan()
                    })
                })
                .collect();

            let mut planned = Vec::with_capacity(handles.len());
            for handle in handles {
                match handle.await {
                    Ok(messages) => planned.push(messages),
                    Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
                    Err(err) => unreachable!("planning task cancelled while joined: {err}"),
                }
            }
            planned
        })
    }
}
