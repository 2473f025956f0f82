use anyhow::{anyhow, bail, Context, Result};
use chrono::{Local, Timelike};
use event_tracker::contract::{
    ConflictPolicy, Event, EventRequest, EventTrackerApi, EventTrackerError, NewCategory,
    TimeContext, UserId,
};

use crate::cli::{Commands, Credentials, EventArgs};

/// Executes one subcommand against the module client and prints the result.
pub async fn run(api: &dyn EventTrackerApi, auth: &Credentials, command: Commands) -> Result<()> {
    match command {
        Commands::Register => {
            let (user, password) = credentials(auth)?;
            let id = api.register(user, password).await?;
            println!("Registered '{user}' (id {id})");
        }
        Commands::Login => {
            let id = login(api, auth).await?;
            println!("Logged in (id {id})");
        }
        Commands::SetPhone { phone } => {
            let id = login(api, auth).await?;
            api.set_phone_number(id, &phone).await?;
            println!("Phone number saved");
        }
        Commands::Add { event, force } => {
            let id = login(api, auth).await?;
            let saved = api
                .add_event(request(id, event)?, policy(force))
                .await
                .map_err(explain_conflict)?;
            println!("Added {}", line(&saved));
        }
        Commands::Update {
            id: event_id,
            event,
            force,
        } => {
            let id = login(api, auth).await?;
            let saved = api
                .update_event(event_id, request(id, event)?, policy(force))
                .await
                .map_err(explain_conflict)?;
            println!("Updated {}", line(&saved));
        }
        Commands::Delete { id: event_id } => {
            let id = login(api, auth).await?;
            api.delete_event(id, event_id).await?;
            println!("Deleted event #{event_id}");
        }
        Commands::List {
            sort,
            category,
            from,
            to,
        } => {
            let id = login(api, auth).await?;
            let events = if category.is_some() || from.is_some() || to.is_some() {
                api.filter_events(id, category, from.as_deref(), to.as_deref())
                    .await?
            } else {
                api.list_events(id, sort).await?
            };
            print_events(&events);
        }
        Commands::Next => {
            let id = login(api, auth).await?;
            match api.next_event(id).await? {
                Some(e) => println!("{}", line(&e)),
                None => println!("No events"),
            }
        }
        Commands::Upcoming => {
            let id = login(api, auth).await?;
            print_events(&api.upcoming_events(id).await?);
        }
        Commands::Find { name, complete } => {
            let id = login(api, auth).await?;
            if complete {
                for n in api.complete_name(id, &name).await? {
                    println!("{n}");
                }
            } else {
                match api.find_by_name(id, &name).await? {
                    Some(e) => println!("{}", line(&e)),
                    None => println!("No event named '{name}'"),
                }
            }
        }
        Commands::OnDate { date } => {
            let id = login(api, auth).await?;
            print_events(&api.events_on_date(id, &date).await?);
        }
        Commands::Conflicts { event, exclude } => {
            let id = login(api, auth).await?;
            let conflicts = api.check_conflicts(&request(id, event)?, exclude).await?;
            if conflicts.is_empty() {
                println!("No conflicts");
            } else {
                print_events(&conflicts);
            }
        }
        Commands::Categories => {
            let id = login(api, auth).await?;
            for c in api.categories(id).await? {
                println!("#{:<4} {:<20} {}", c.id, c.name, c.color);
            }
        }
        Commands::AddCategory { name, color } => {
            let id = login(api, auth).await?;
            let c = api
                .add_category(NewCategory {
                    user_id: id,
                    name,
                    color,
                })
                .await?;
            println!("Added category #{} {} ({})", c.id, c.name, c.color);
        }
        Commands::Counts => {
            let id = login(api, auth).await?;
            for c in api.category_counts(id).await? {
                println!("{:<20} {}", c.category.name, c.count);
            }
        }
        Commands::Export { path, summary } => {
            let id = login(api, auth).await?;
            if summary {
                api.export_summary(id, &path).await?;
                println!("Summary written to {}", path.display());
            } else {
                let n = api.export_csv(id, &path).await?;
                println!("Exported {n} event(s) to {}", path.display());
            }
        }
        Commands::Suggest { hour, location } => {
            let id = login(api, auth).await?;
            let hour = hour.unwrap_or_else(|| Local::now().hour());
            let title = api
                .suggest_title(id, TimeContext::from_hour(hour), location.as_deref())
                .await?;
            println!("{title}");
        }
        Commands::Check => bail!("check is handled before connecting"),
    }
    Ok(())
}

fn credentials(auth: &Credentials) -> Result<(&str, &str)> {
    match (auth.user.as_deref(), auth.password.as_deref()) {
        (Some(u), Some(p)) => Ok((u, p)),
        _ => Err(anyhow!("this command needs --user and --password")),
    }
}

async fn login(api: &dyn EventTrackerApi, auth: &Credentials) -> Result<UserId> {
    let (user, password) = credentials(auth)?;
    api.login(user, password)
        .await
        .with_context(|| format!("login as '{user}' failed"))
}

fn request(user_id: UserId, args: EventArgs) -> Result<EventRequest> {
    Ok(EventRequest::builder(user_id)
        .name(args.name)
        .date(args.date)
        .time_opt(args.time)
        .category(args.category)
        .build()?)
}

fn policy(force: bool) -> ConflictPolicy {
    if force {
        ConflictPolicy::Proceed
    } else {
        ConflictPolicy::Warn
    }
}

fn explain_conflict(err: EventTrackerError) -> anyhow::Error {
    if let EventTrackerError::Conflict { conflicts } = &err {
        eprintln!("This event overlaps with:");
        for e in conflicts {
            eprintln!("  {}", line(e));
        }
        eprintln!("Re-run with --force to save it anyway.");
    }
    err.into()
}

fn print_events(events: &[Event]) {
    if events.is_empty() {
        println!("No events");
        return;
    }
    for e in events {
        println!("{}", line(e));
    }
}

fn line(e: &Event) -> String {
    let today = Local::now().date_naive();
    let when = if e.is_today(today) {
        " (today)".to_string()
    } else if e.is_past(today) {
        " (past)".to_string()
    } else {
        e.days_until(today)
            .map(|d| format!(" (in {d} day(s))"))
            .unwrap_or_default()
    };
    format!(
        "#{:<4} {:<10} {:<8} {}{}{}",
        e.id,
        e.date,
        e.time.as_deref().unwrap_or(""),
        e.name,
        e.category_name()
            .map(|c| format!(" [{c}]"))
            .unwrap_or_default(),
        when,
    )
}
