use crate::output::{print_json, print_table, yes_no};
use clap::Subcommand;
use std::path::Path;
use wakeup_core::model::{parse_alarm, Subscriber};
use wakeup_core::store::WakeupStore;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum SubscriberSubcommand {
    /// Register a subscriber
    Add {
        username: String,
        /// Phone number to call (E.164)
        phone: String,
        /// Alarm time of day, UTC (HH:MM)
        alarm: String,
        /// Address for contact notifications
        #[arg(long)]
        email: Option<String>,
        /// Keep the alarm on after each cycle
        #[arg(long)]
        recurring: bool,
        /// Register without activating the account
        #[arg(long)]
        inactive: bool,
        /// Register with the alarm switched off
        #[arg(long)]
        alarm_off: bool,
    },

    /// Switch a subscriber's alarm on (optionally moving it) or off
    Alarm {
        username: String,
        /// New alarm time of day, UTC (HH:MM)
        #[arg(long)]
        at: Option<String>,
        /// Switch the alarm off instead
        #[arg(long, conflicts_with = "at")]
        off: bool,
    },

    /// List all subscribers
    List,

    /// Show one subscriber
    Show { username: String },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: SubscriberSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        SubscriberSubcommand::Add {
            username,
            phone,
            alarm,
            email,
            recurring,
            inactive,
            alarm_off,
        } => {
            let mut subscriber = Subscriber::new(username, phone, parse_alarm(&alarm)?);
            subscriber.email = email;
            subscriber.recurring = recurring;
            subscriber.activated = !inactive;
            subscriber.alarm_on = !alarm_off;
            add(root, &subscriber, json)
        }
        SubscriberSubcommand::Alarm { username, at, off } => {
            set_alarm(root, &username, at.as_deref(), off, json)
        }
        SubscriberSubcommand::List => list(root, json),
        SubscriberSubcommand::Show { username } => show(root, &username, json),
    }
}

fn add(root: &Path, subscriber: &Subscriber, json: bool) -> anyhow::Result<()> {
    let db = super::open_db(root)?;
    db.insert_subscriber(subscriber)?;
    if json {
        print_json(subscriber)
    } else {
        println!(
            "Added {} ({}), alarm {}",
            subscriber.username,
            subscriber.phone,
            subscriber.alarm.format("%H:%M")
        );
        Ok(())
    }
}

fn set_alarm(
    root: &Path,
    username: &str,
    at: Option<&str>,
    off: bool,
    json: bool,
) -> anyhow::Result<()> {
    let db = super::open_db(root)?;
    let mut subscriber = super::subscriber_by_name(&db, username)?;
    if let Some(at) = at {
        subscriber.alarm = parse_alarm(at)?;
    }
    subscriber.alarm_on = !off;
    db.update_subscriber(&subscriber)?;
    if json {
        return print_json(&subscriber);
    }
    if subscriber.alarm_on {
        println!(
            "Alarm for {} on at {}",
            subscriber.username,
            subscriber.alarm.format("%H:%M")
        );
    } else {
        println!("Alarm for {} off", subscriber.username);
    }
    Ok(())
}

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let db = super::open_db(root)?;
    let subscribers = db.list_subscribers()?;
    if json {
        return print_json(&subscribers);
    }
    if subscribers.is_empty() {
        println!("No subscribers.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = subscribers
        .iter()
        .map(|s| {
            vec![
                s.username.clone(),
                s.phone.clone(),
                s.alarm.format("%H:%M").to_string(),
                yes_no(s.alarm_on),
                yes_no(s.activated),
                yes_no(s.recurring),
            ]
        })
        .collect();
    print_table(
        &["USERNAME", "PHONE", "ALARM", "ON", "ACTIVE", "RECURRING"],
        &rows,
    );
    Ok(())
}

fn show(root: &Path, username: &str, json: bool) -> anyhow::Result<()> {
    let db = super::open_db(root)?;
    let s = super::subscriber_by_name(&db, username)?;
    if json {
        return print_json(&s);
    }
    println!("Username:  {}", s.username);
    println!("Id:        {}", s.id);
    println!("Phone:     {}", s.phone);
    println!("Email:     {}", s.email.as_deref().unwrap_or("-"));
    println!(
        "Alarm:     {} ({})",
        s.alarm.format("%H:%M"),
        if s.alarm_on { "on" } else { "off" }
    );
    println!("Activated: {}", yes_no(s.activated));
    println!("Recurring: {}", yes_no(s.recurring));
    println!("Matched:   {}", yes_no(s.any_match));
    Ok(())
}
