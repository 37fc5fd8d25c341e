//! Pipeline runtime.
//!
//! One task per filter serialises message delivery and the filter's ticker.
//! External input waits for queue space. A single output task takes injected
//! packs, offers them back to matching filters without waiting, writes them
//! to the sink, and then drops them, which returns the pack to the pool.
//!
//! Shutdown is two-phase: filters stop first (each runs `clean_up`), then the
//! output task drains whatever they injected on the way out.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_yaml::Mapping;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

use logcount_core::error::{LogCountError, Result};
use logcount_core::message::Message;

use crate::config::PipelineConfig;
use crate::plugin::{Filter, FilterRunner};
use crate::registry::PluginRegistry;
use crate::router::MessageMatcher;
use crate::runner::{ChannelRunner, OutputPack, PackPool};
use crate::sink::OutputSink;

struct Route {
    name: Arc<str>,
    matcher: MessageMatcher,
    tx: mpsc::Sender<Arc<Message>>,
}

/// Fan-out table shared by external input and the output task.
struct Routes(Vec<Route>);

impl Routes {
    /// Wait for room in each matching filter's queue.
    async fn send(&self, msg: Arc<Message>) -> usize {
        let mut delivered = 0;
        for r in &self.0 {
            if !r.matcher.matches(&msg) {
                continue;
            }
            if r.tx.send(Arc::clone(&msg)).await.is_ok() {
                delivered += 1;
            } else {
                tracing::debug!(filter = %r.name, "filter stopped, message dropped");
            }
        }
        delivered
    }

    /// Never waits; used for re-routed output so the output task cannot
    /// block on a filter that is itself blocked on output.
    fn offer(&self, msg: Arc<Message>) -> usize {
        let mut delivered = 0;
        for r in &self.0 {
            if !r.matcher.matches(&msg) {
                continue;
            }
            match r.tx.try_send(Arc::clone(&msg)) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(filter = %r.name, "filter queue full, message dropped");
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(filter = %r.name, "filter stopped, message dropped");
                }
            }
        }
        delivered
    }
}

struct FilterSlot {
    name: Arc<str>,
    filter: Arc<dyn Filter>,
    runner: Arc<ChannelRunner>,
    settings: Mapping,
}

pub struct Pipeline {
    slots: Vec<FilterSlot>,
    routes: Arc<Routes>,
    pool: PackPool,
    filter_tasks: Mutex<Vec<JoinHandle<()>>>,
    output_task: Mutex<Option<JoinHandle<()>>>,
    stop_filters: watch::Sender<bool>,
    stop_output: watch::Sender<bool>,
}

impl Pipeline {
    /// Build, configure, and start every filter in `cfg`.
    ///
    /// Must be called from within a tokio runtime. Any filter failing to
    /// configure aborts startup; nothing is spawned in that case.
    pub fn start(
        cfg: &PipelineConfig,
        registry: &PluginRegistry,
        sink: Arc<dyn OutputSink>,
    ) -> Result<Self> {
        let section = &cfg.pipeline;
        let pool = PackPool::new(section.pool_size);
        let (out_tx, out_rx) = mpsc::channel::<OutputPack>(section.output_chan_size);

        let mut slots = Vec::with_capacity(cfg.filters.len());
        let mut routes = Vec::with_capacity(cfg.filters.len());
        let mut inbound = Vec::with_capacity(cfg.filters.len());

        for fc in &cfg.filters {
            let name: Arc<str> = Arc::from(fc.name.as_str());
            let matcher = MessageMatcher::compile(fc.message_matcher.as_deref(), &fc.name)?;
            let filter = registry.create_filter(&fc.kind)?;

            filter.configure(&fc.settings).map_err(|e| match e {
                LogCountError::Configuration(msg) => {
                    LogCountError::Configuration(format!("filter {}: {msg}", fc.name))
                }
                other => other,
            })?;

            let runner = Arc::new(ChannelRunner::new(
                Arc::clone(&name),
                pool.clone(),
                out_tx.clone(),
            ));
            filter.prepare(Arc::clone(&runner) as Arc<dyn FilterRunner>)?;

            let (tx, rx) = mpsc::channel::<Arc<Message>>(section.plugin_chan_size);
            routes.push(Route {
                name: Arc::clone(&name),
                matcher,
                tx,
            });
            inbound.push(rx);
            slots.push(FilterSlot {
                name,
                filter,
                runner,
                settings: fc.settings.clone(),
            });
        }
        drop(out_tx);

        let routes = Arc::new(Routes(routes));
        let (stop_filters, filters_rx) = watch::channel(false);
        let (stop_output, output_rx) = watch::channel(false);

        let mut filter_tasks = Vec::with_capacity(slots.len());
        for (slot, rx) in slots.iter().zip(inbound) {
            let every = slot.filter.ticker_interval();
            tracing::info!(filter = %slot.name, ticker = ?every, "filter started");
            filter_tasks.push(tokio::spawn(run_filter(
                Arc::clone(&slot.name),
                Arc::clone(&slot.filter),
                rx,
                every,
                filters_rx.clone(),
            )));
        }

        let output_task = tokio::spawn(run_output(
            Arc::clone(&routes),
            out_rx,
            sink,
            output_rx,
        ));

        Ok(Self {
            slots,
            routes,
            pool,
            filter_tasks: Mutex::new(filter_tasks),
            output_task: Mutex::new(Some(output_task)),
            stop_filters,
            stop_output,
        })
    }

    pub fn filter_names(&self) -> Vec<&str> {
        self.slots.iter().map(|s| s.name.as_ref()).collect()
    }

    /// Output packs currently free.
    pub fn packs_available(&self) -> usize {
        self.pool.available()
    }

    /// Deliver an external message to every matching filter, waiting while
    /// a filter's queue is full. Returns how many filters accepted it.
    pub async fn route(&self, msg: Message) -> usize {
        self.routes.send(Arc::new(msg)).await
    }

    /// Reset a filter and bring it back with its configured settings.
    pub fn restart_filter(&self, name: &str) -> Result<()> {
        let slot = self
            .slots
            .iter()
            .find(|s| s.name.as_ref() == name)
            .ok_or_else(|| LogCountError::UnknownPlugin(name.to_string()))?;

        slot.filter.cleanup_for_restart();
        slot.filter.configure(&slot.settings)?;
        slot.filter
            .prepare(Arc::clone(&slot.runner) as Arc<dyn FilterRunner>)?;
        tracing::info!(filter = %slot.name, "filter restarted");
        Ok(())
    }

    /// Stop all filters, then drain and stop output.
    pub async fn shutdown(&self) {
        let _ = self.stop_filters.send(true);
        let tasks: Vec<JoinHandle<()>> = std::mem::take(&mut *self.filter_tasks.lock());
        for t in tasks {
            if let Err(e) = t.await {
                tracing::error!(error = %e, "filter task failed");
            }
        }

        let _ = self.stop_output.send(true);
        let output = self.output_task.lock().take();
        if let Some(t) = output {
            if let Err(e) = t.await {
                tracing::error!(error = %e, "output task failed");
            }
        }
        self.pool.close();
        tracing::info!("pipeline stopped");
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(t) => {
            t.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

async fn run_filter(
    name: Arc<str>,
    filter: Arc<dyn Filter>,
    mut rx: mpsc::Receiver<Arc<Message>>,
    every: Option<Duration>,
    mut stop: watch::Receiver<bool>,
) {
    let mut ticker = every.map(|every| {
        let mut t = interval_at(Instant::now() + every, every);
        t.set_missed_tick_behavior(MissedTickBehavior::Delay);
        t
    });

    loop {
        tokio::select! {
            biased;

            _ = stop.changed() => break,

            maybe = rx.recv() => {
                let Some(msg) = maybe else { break; };
                if let Err(e) = filter.observe(&msg) {
                    tracing::warn!(filter = %name, error = %e, "observe failed");
                }
            }

            _ = next_tick(&mut ticker) => {
                // Errors were already reported through the runner.
                if let Err(e) = filter.on_tick() {
                    tracing::debug!(filter = %name, code = e.code().as_str(), "tick skipped");
                }
            }
        }
    }

    filter.clean_up();
    tracing::debug!(filter = %name, "filter stopped");
}

async fn deliver(routes: &Routes, sink: &dyn OutputSink, pack: OutputPack) {
    let msg = Arc::new(pack.message.clone());
    routes.offer(Arc::clone(&msg));
    if let Err(e) = sink.write(&msg).await {
        tracing::warn!(logger = %msg.logger, error = %e, "output write failed");
    }
    drop(pack);
}

async fn run_output(
    routes: Arc<Routes>,
    mut rx: mpsc::Receiver<OutputPack>,
    sink: Arc<dyn OutputSink>,
    mut stop: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            biased;

            maybe = rx.recv() => {
                let Some(pack) = maybe else { break; };
                deliver(&routes, sink.as_ref(), pack).await;
            }

            _ = stop.changed() => break,
        }
    }

    rx.close();
    while let Ok(pack) = rx.try_recv() {
        deliver(&routes, sink.as_ref(), pack).await;
    }
}
