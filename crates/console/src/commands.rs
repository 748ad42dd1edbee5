use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail};
use configs::AppConfig;
use models::settings::SettingsForm;
use models::user::{NewUser, UserStatusUpdate};
use models::{CollectionPage, Credentials};
use serde::de::DeserializeOwned;
use service::collection::Resolution;
use service::{AdminError, AdminService, CollectionView, LiveMapMonitor, SessionManager};
use tracing::{debug, info};

use crate::cli::{
    Command, LogsCommand, MapCommand, PageArgs, PaymentsCommand, RidesCommand, SettingsCommand, UsersCommand,
};
use crate::render;

/// Everything a command needs, built once at startup.
pub struct Context {
    pub config: AppConfig,
    pub session: Arc<SessionManager>,
    pub admin: AdminService,
}

/// Run one command, writing its output to `out`.
pub async fn execute<W: Write + Send>(ctx: &Context, command: Command, out: &mut W) -> anyhow::Result<()> {
    match command {
        Command::Login { email, password } => {
            let user = ctx.session.login(Credentials::new(email, password)).await?;
            writeln!(out, "Signed in as {} ({})", user.full_name, user.role)?;
        }
        Command::Logout => {
            ctx.session.logout().await?;
            writeln!(out, "Signed out")?;
        }
        guarded => {
            let user = ctx.session.require_authenticated().await?;
            debug!(user = %user.email, "session guard passed");
            run_guarded(ctx, guarded, out).await?;
        }
    }
    Ok(())
}

async fn run_guarded<W: Write + Send>(ctx: &Context, command: Command, out: &mut W) -> anyhow::Result<()> {
    match command {
        Command::Whoami => {
            let user = ctx.session.current_user().ok_or(AdminError::NotAuthenticated)?;
            write!(out, "{}", render::identity(&user))?;
        }
        Command::Dashboard => write!(out, "{}", render::dashboard(&ctx.admin.dashboard().await?))?,
        Command::Users { action } => users(ctx, action, out).await?,
        Command::Rides { action: RidesCommand::List { page, status } } => {
            let view = ctx.admin.rides_view();
            let rows = list(&view, &[("status", status)], &page).await?;
            write!(out, "{}", render::rides(&rows))?;
        }
        Command::Payments { action: PaymentsCommand::List { page, provider, status } } => {
            let view = ctx.admin.payments_view();
            let rows = list(&view, &[("provider", provider), ("status", status)], &page).await?;
            write!(out, "{}", render::payments(&rows))?;
        }
        Command::Logs { action: LogsCommand::List { page, kind } } => {
            let view = ctx.admin.logs_view();
            let rows = list(&view, &[("type", kind)], &PageArgs { page, search: None }).await?;
            write!(out, "{}", render::logs(&rows))?;
        }
        Command::Settings { action } => settings(ctx, action, out).await?,
        Command::Map { action: MapCommand::Watch { interval, ticks } } => {
            let every = interval.map(Duration::from_secs).unwrap_or_else(|| ctx.config.live_map.poll_interval());
            watch_map(ctx, every, ticks, out).await?;
        }
        Command::Login { .. } | Command::Logout => bail!("login and logout do not need a session"),
    }
    Ok(())
}

/// Apply filters, search and page (in that order, since the first two reset
/// the page) and resolve the view.
async fn list<R>(
    view: &CollectionView<R>,
    filters: &[(&str, Option<String>)],
    args: &PageArgs,
) -> anyhow::Result<Arc<CollectionPage<R>>>
where
    R: DeserializeOwned + Send + Sync + 'static,
{
    for (name, value) in filters {
        if let Some(value) = value {
            view.set_filter(name, value).await?;
        }
    }
    if let Some(term) = &args.search {
        view.set_search(term).await?;
    }
    view.set_page(args.page).await?;
    match view.resolve().await? {
        Resolution::Fetched(page) => Ok(page),
        _ => view.state().await.page().cloned().ok_or_else(|| anyhow!("no {} page loaded", view.resource())),
    }
}

async fn users<W: Write + Send>(ctx: &Context, action: UsersCommand, out: &mut W) -> anyhow::Result<()> {
    match action {
        UsersCommand::List { page, role } => {
            let view = ctx.admin.users_view();
            let rows = list(&view, &[("role", role)], &page).await?;
            write!(out, "{}", render::users(&rows))?;
        }
        UsersCommand::Show { id } => {
            let user = ctx.admin.user_details(&id).await?;
            write!(out, "{}", render::user_detail(&user))?;
        }
        UsersCommand::Create(args) => {
            let created = ctx.admin.create_user(NewUser::from(args)).await?;
            writeln!(out, "Created {} {} ({})", created.role, created.full_name, created.email)?;
        }
        UsersCommand::Delete { id } => {
            ctx.admin.delete_user(&id).await?;
            writeln!(out, "Deleted user {id}")?;
        }
        UsersCommand::Status { id, action, reason } => {
            let update = UserStatusUpdate { action: action.into(), reason };
            ctx.admin.update_user_status(&id, update).await?;
            writeln!(out, "Updated user {id}: {action:?}")?;
        }
    }
    Ok(())
}

async fn settings<W: Write + Send>(ctx: &Context, action: SettingsCommand, out: &mut W) -> anyhow::Result<()> {
    match action {
        SettingsCommand::Show => write!(out, "{}", render::settings(&ctx.admin.settings().await?))?,
        SettingsCommand::Update(args) => {
            let edits = SettingsForm::from(args);
            if edits.is_empty() {
                bail!("nothing to update; pass at least one setting");
            }
            let current = ctx.admin.settings().await?;
            let next = SettingsForm::from_current(&current).apply(edits).into_settings().map_err(AdminError::from)?;
            let saved = ctx.admin.update_settings(next).await?;
            info!("fare settings saved");
            write!(out, "{}", render::settings(&saved))?;
        }
    }
    Ok(())
}

async fn watch_map<W: Write + Send>(
    ctx: &Context,
    every: Duration,
    ticks: Option<u32>,
    out: &mut W,
) -> anyhow::Result<()> {
    let monitor = LiveMapMonitor::new(ctx.admin.clone());
    let mut updates = monitor.subscribe();
    let handle = monitor.start(every);
    // updates close together coalesce, so count polls by dispatch number
    while updates.changed().await.is_ok() {
        let state = monitor.state();
        write!(out, "{}", render::live_map(&state))?;
        out.flush()?;
        if monitor.is_stopped() {
            return Err(AdminError::AuthorizationExpired.into());
        }
        if ticks.is_some_and(|t| state.seq >= u64::from(t)) {
            break;
        }
    }
    handle.stop();
    Ok(())
}
