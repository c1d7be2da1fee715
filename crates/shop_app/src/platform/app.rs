use std::fs;
use std::path::Path;
use std::sync::mpsc;
use std::time::Duration;

use anyhow::{bail, Context};
use shop_core::{render, update, Fingerprint, Msg, ShopState, ShopTemplate, ThreadId};
use shop_logging::{shop_debug, shop_info, shop_warn};

use super::cli::{Cli, Command, ConfigureArgs};
use super::clock;
use super::effects::EffectRunner;
use super::logging::{self, LogDestination};
use super::persistence::{load_settings, save_settings, Settings};
use super::scheduler::ThreadScheduler;
use super::snapshot::load_snapshot;
use super::status::TerminalStatusReporter;

/// Upper bound on waiting for the engine during one-shot commands. Each
/// request has its own, shorter timeout.
const ENGINE_WAIT: Duration = Duration::from_secs(300);

pub fn run_app(cli: Cli) -> anyhow::Result<()> {
    let destination = if cli.log_file {
        LogDestination::Both
    } else {
        LogDestination::Terminal
    };
    logging::initialize(destination, cli.verbose);

    let settings = load_settings(&cli.settings)
        .with_context(|| format!("loading settings from {}", cli.settings.display()))?;

    match cli.command {
        Command::Render { items, fingerprint } => {
            let template = ShopTemplate::parse(&settings.template)?;
            let snapshot = load_snapshot(&items)?;
            let text = render(&snapshot, &template)?;
            if fingerprint {
                println!("{}", Fingerprint::of(&text));
            } else {
                print!("{text}");
            }
            Ok(())
        }
        Command::Configure(args) => {
            let mut settings = settings;
            apply_changes(&mut settings, args)?;
            save_settings(&cli.settings, &settings)?;
            println!("{}", describe(&settings));
            Ok(())
        }
        Command::Update { items } => {
            let snapshot = load_snapshot(&items)?;
            let mut session = Session::start(&settings, cli.session_cookie)?;
            let now = clock::now();
            session.dispatch(Msg::SnapshotArrived { snapshot, now });
            session.dispatch(Msg::UpdateRequested { now });
            session.finish()
        }
        Command::Bump => {
            let mut session = Session::start(&settings, cli.session_cookie)?;
            session.dispatch(Msg::BumpRequested { now: clock::now() });
            session.finish()
        }
        Command::Watch { items } => {
            if !settings.auto_update && !settings.auto_bump {
                bail!(
                    "nothing to watch: enable auto_update or auto_bump with `shopsync configure`"
                );
            }
            let mut session = Session::start(&settings, cli.session_cookie)?;
            session.dispatch(Msg::SetAutoBump(settings.auto_bump));
            session.dispatch(Msg::SetAutoUpdate(settings.auto_update));
            session.watch(&items)
        }
    }
}

/// One shop session driven by the message loop.
struct Session {
    state: ShopState,
    runner: EffectRunner,
    msg_rx: mpsc::Receiver<Msg>,
}

impl Session {
    fn start(settings: &Settings, session_cookie: Option<String>) -> anyhow::Result<Self> {
        if session_cookie.is_none() {
            shop_warn!("No session cookie given; the forum will likely refuse the request");
        }
        let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
        let runner = EffectRunner::new(
            settings.client_settings(session_cookie),
            msg_tx.clone(),
            Box::new(TerminalStatusReporter::new(std::io::stdout())),
            Box::new(ThreadScheduler::new(msg_tx)),
        )?;

        let mut session = Self {
            state: ShopState::new(settings.session_settings()),
            runner,
            msg_rx,
        };
        session.dispatch(Msg::SetShopTemplate(settings.template.clone()));
        if let Some(thread) = &settings.thread {
            session.dispatch(Msg::SetThread(thread.clone()));
        }
        Ok(session)
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            let view = state.view();
            shop_debug!(
                "edit={:?} bump={:?} stale={} fingerprint={}",
                view.edit,
                view.bump,
                view.stale,
                view.fingerprint
            );
        }
        self.state = state;
        self.runner.run(effects);
    }

    /// Pumps completions until no workflow is left, then reports the outcome.
    fn finish(mut self) -> anyhow::Result<()> {
        while !self.state.is_idle() {
            let msg = self
                .msg_rx
                .recv_timeout(ENGINE_WAIT)
                .context("no answer from the forum engine")?;
            self.dispatch(msg);
        }

        let outcome = self.runner.outcome();
        if !outcome.failures.is_empty() {
            bail!(outcome.failures.join("; "));
        }
        if outcome.completed.is_empty() {
            shop_info!("Nothing to do");
        }
        Ok(())
    }

    /// Runs until the process is stopped. The snapshot file is re-read before
    /// every timer tick is handled. Outcomes were already shown by the status
    /// reporter, so they are dropped after each message.
    fn watch(mut self, items: &Path) -> anyhow::Result<()> {
        self.reload(items);
        self.runner.take_outcome();
        loop {
            let msg = self.msg_rx.recv().context("session channel closed")?;
            if matches!(msg, Msg::TimerFired { .. }) {
                self.reload(items);
            }
            self.dispatch(msg);
            self.runner.take_outcome();
        }
    }

    fn reload(&mut self, items: &Path) {
        match load_snapshot(items) {
            Ok(snapshot) => self.dispatch(Msg::SnapshotArrived {
                snapshot,
                now: clock::now(),
            }),
            Err(err) => shop_warn!("Keeping previous items: {}", err),
        }
    }
}

/// Validates and applies `configure` flags. Nothing is changed on error.
fn apply_changes(settings: &mut Settings, args: ConfigureArgs) -> anyhow::Result<()> {
    let mut next = settings.clone();

    if let Some(thread) = args.thread {
        let thread = ThreadId::parse(&thread)?;
        next.thread = Some(thread.to_string());
    }
    if let Some(path) = args.template_file {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("reading template {}", path.display()))?;
        ShopTemplate::parse(&text)?;
        next.template = text;
    }
    if let Some(enabled) = args.auto_update {
        next.auto_update = enabled;
    }
    if let Some(enabled) = args.auto_bump {
        next.auto_bump = enabled;
    }
    if let Some(base_url) = args.base_url {
        next.forum.base_url = base_url;
    }
    if let Some(message) = args.bump_message {
        next.forum.bump_message = message;
    }
    if let Some(minutes) = args.min_bump_interval {
        next.min_bump_interval_secs = minutes * 60;
    }
    if let Some(minutes) = args.tick_interval {
        if minutes == 0 {
            bail!("tick interval must be at least one minute");
        }
        next.tick_interval_secs = minutes * 60;
    }

    next.endpoints().validate()?;

    *settings = next;
    Ok(())
}

fn describe(settings: &Settings) -> String {
    format!(
        "thread: {}\nforum: {}\nauto update: {}\nauto bump: {} (at most every {} min)\n\
         tick: every {} min",
        settings.thread.as_deref().unwrap_or("<not set>"),
        settings.forum.base_url,
        settings.auto_update,
        settings.auto_bump,
        settings.min_bump_interval_secs / 60,
        settings.tick_interval_secs / 60,
    )
}
