use std::sync::{mpsc, Arc};

use shop_core::{Effect, ForumForm, Msg, ShopStatus, Track, WorkflowFailure};
use shop_engine::{
    ClientSettings, EngineError, EngineEvent, EngineHandle, EventSink, FailureKind, FetchError,
};
use shop_logging::{shop_debug, shop_warn, shop_workflow};

use super::clock;
use super::scheduler::Scheduler;
use super::status::StatusReporter;

/// What happened to the workflows started in this run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    pub completed: Vec<Track>,
    pub failures: Vec<String>,
}

impl RunOutcome {
    fn record(&mut self, effect: &Effect) {
        match effect {
            Effect::Status(event) => match &event.state {
                ShopStatus::Completed => self.completed.push(event.track),
                ShopStatus::Failed(reason) => {
                    self.failures.push(format!("{}: {}", event.track, reason))
                }
                ShopStatus::Submitting => {}
            },
            Effect::ConfigurationError(err) => {
                let message = err.to_string();
                if !self.failures.contains(&message) {
                    self.failures.push(message);
                }
            }
            _ => {}
        }
    }
}

/// Carries out the effects returned by `update`.
pub struct EffectRunner {
    engine: EngineHandle,
    reporter: Box<dyn StatusReporter>,
    scheduler: Box<dyn Scheduler>,
    outcome: RunOutcome,
}

impl EffectRunner {
    pub fn new(
        client_settings: ClientSettings,
        msg_tx: mpsc::Sender<Msg>,
        reporter: Box<dyn StatusReporter>,
        scheduler: Box<dyn Scheduler>,
    ) -> Result<Self, EngineError> {
        let engine = EngineHandle::with_reqwest(client_settings, Arc::new(MsgSink { msg_tx }))?;
        Ok(Self {
            engine,
            reporter,
            scheduler,
            outcome: RunOutcome::default(),
        })
    }

    pub fn run(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            self.outcome.record(&effect);
            match effect {
                Effect::FetchPage {
                    request,
                    track,
                    url,
                    token_field,
                } => {
                    shop_workflow!("{} #{}: GET {}", track, request, url);
                    self.engine.fetch(request, url, token_field);
                }
                Effect::SubmitForm {
                    request,
                    track,
                    url,
                    form,
                } => {
                    shop_debug!(
                        "{} #{}: submitting {} fields",
                        track,
                        request,
                        form.fields().len()
                    );
                    self.engine.submit(request, url, form.fields().to_vec());
                }
                Effect::Status(event) => self.reporter.report(&event),
                Effect::ConfigurationError(err) => self.reporter.configuration_error(&err),
                Effect::ArmTimer { interval } => self.scheduler.arm(interval),
                Effect::DisarmTimer => self.scheduler.disarm(),
            }
        }
    }

    pub fn outcome(&self) -> &RunOutcome {
        &self.outcome
    }

    /// Hands over everything recorded so far and starts a fresh outcome.
    pub fn take_outcome(&mut self) -> RunOutcome {
        std::mem::take(&mut self.outcome)
    }
}

/// Turns engine completions into session messages stamped with the arrival time.
struct MsgSink {
    msg_tx: mpsc::Sender<Msg>,
}

impl EventSink for MsgSink {
    fn emit(&self, event: EngineEvent) {
        if self.msg_tx.send(to_msg(event)).is_err() {
            shop_warn!("Session loop is gone; engine event dropped");
        }
    }
}

fn to_msg(event: EngineEvent) -> Msg {
    let now = clock::now();
    match event {
        EngineEvent::PageFetched { request, result } => Msg::PageFetched {
            request,
            result: result
                .map(|page| ForumForm {
                    token: page.token,
                    title: page.title,
                })
                .map_err(to_failure),
            now,
        },
        EngineEvent::FormSubmitted { request, result } => Msg::FormSubmitted {
            request,
            result: result
                .map(|receipt| {
                    shop_debug!("Forum answered {} at {}", receipt.status, receipt.final_url);
                })
                .map_err(to_failure),
            now,
        },
    }
}

fn to_failure(err: FetchError) -> WorkflowFailure {
    match err.kind {
        FailureKind::HttpStatus(code) => WorkflowFailure::HttpStatus(code),
        FailureKind::TokenMissing => WorkflowFailure::TokenMissing,
        FailureKind::Rejected => WorkflowFailure::Rejected(err.message),
        _ => WorkflowFailure::Network(err.to_string()),
    }
}
