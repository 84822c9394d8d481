use chrono::{NaiveDate, Utc};

use super::{staff_display, windows_list, FlowContext, FlowReply, SideEffect};
use crate::models::catalog::contains_phrase;
use crate::models::{
    BusinessProfile, CreateFlow, CreateStep, DraftReservation, OwnerKind, Reservation,
    ReservationStatus, TimeRange, UNASSIGNED_STAFF,
};
use crate::services::availability::{self, validate_user_range};
use crate::services::conflict::{describe_conflicts, find_conflicts};

/// First reply of the Create flow, sent in the same turn the session is
/// created.
pub fn opening_reply(profile: &BusinessProfile) -> String {
    format!("Happy to get you booked in!\n\n{}", service_prompt(profile))
}

pub async fn advance(
    flow: &mut CreateFlow,
    ctx: &FlowContext<'_>,
    message: &str,
) -> anyhow::Result<FlowReply> {
    if let Some(reply) = navigate_back(flow, ctx, message) {
        return Ok(reply);
    }
    match flow.step {
        CreateStep::ServiceSelection => Ok(service_selection(flow, ctx, message)),
        CreateStep::StaffSelection => Ok(staff_selection(flow, ctx, message)),
        CreateStep::DateSelection => date_selection(flow, ctx, message).await,
        CreateStep::TimeSelection => time_selection(flow, ctx, message).await,
        CreateStep::Confirmation => confirmation(flow, ctx, message).await,
    }
}

fn service_prompt(profile: &BusinessProfile) -> String {
    format!(
        "Which service would you like?\n\n{}\n\nSend the service name. You can send \"cancel\" at any time to stop.",
        profile.service_menu()
    )
}

fn staff_prompt(profile: &BusinessProfile) -> String {
    format!(
        "Who would you like?\n\n{}\n\nSend a staff name, or \"no preference\".",
        profile.staff_menu()
    )
}

fn date_prompt() -> &'static str {
    "Which date works for you? Send it as YYYY-MM-DD, e.g. 2025-02-03."
}

fn step_rank(step: CreateStep) -> u8 {
    match step {
        CreateStep::ServiceSelection => 0,
        CreateStep::StaffSelection => 1,
        CreateStep::DateSelection => 2,
        CreateStep::TimeSelection => 3,
        CreateStep::Confirmation => 4,
    }
}

/// "change service" and friends jump back to an earlier selection state,
/// discarding everything chosen after it.
fn navigate_back(
    flow: &mut CreateFlow,
    ctx: &FlowContext<'_>,
    message: &str,
) -> Option<FlowReply> {
    let keywords = &ctx.profile.keywords;
    let rank = step_rank(flow.step);

    if rank > step_rank(CreateStep::ServiceSelection)
        && keywords
            .back_service
            .iter()
            .any(|p| contains_phrase(message, p))
    {
        flow.draft.service = None;
        flow.draft.clear_staff_onward();
        flow.step = CreateStep::ServiceSelection;
        return Some(FlowReply::stay(format!(
            "Sure, let's pick the service again. {}",
            service_prompt(ctx.profile)
        )));
    }
    if rank > step_rank(CreateStep::StaffSelection)
        && keywords
            .back_staff
            .iter()
            .any(|p| contains_phrase(message, p))
    {
        flow.draft.clear_staff_onward();
        flow.step = CreateStep::StaffSelection;
        return Some(FlowReply::stay(format!(
            "Sure, let's pick the staff again. {}",
            staff_prompt(ctx.profile)
        )));
    }
    if rank > step_rank(CreateStep::DateSelection)
        && keywords
            .back_date
            .iter()
            .any(|p| contains_phrase(message, p))
    {
        flow.draft.clear_date_onward();
        flow.step = CreateStep::DateSelection;
        return Some(FlowReply::stay(format!(
            "Sure, let's pick the date again. {}",
            date_prompt()
        )));
    }
    None
}

/// A draft field we rely on is missing; the only safe move is back to the
/// top of the flow.
fn restart(flow: &mut CreateFlow, ctx: &FlowContext<'_>) -> FlowReply {
    flow.draft = DraftReservation::default();
    flow.step = CreateStep::ServiceSelection;
    FlowReply::stay(format!(
        "Something went wrong on our side, let's start over. {}",
        service_prompt(ctx.profile)
    ))
}

fn service_selection(flow: &mut CreateFlow, ctx: &FlowContext<'_>, message: &str) -> FlowReply {
    let Some(service) = ctx.profile.find_service(message) else {
        return FlowReply::stay(format!(
            "Sorry, we don't offer that one. {}",
            service_prompt(ctx.profile)
        ));
    };
    flow.draft.service = Some(service.name.clone());
    flow.step = CreateStep::StaffSelection;
    FlowReply::stay(format!(
        "{}, great choice. {}",
        service.name,
        staff_prompt(ctx.profile)
    ))
}

fn staff_selection(flow: &mut CreateFlow, ctx: &FlowContext<'_>, message: &str) -> FlowReply {
    let Some(staff) = ctx.profile.find_staff(message) else {
        return FlowReply::stay(format!(
            "We don't have anyone by that name. {}",
            staff_prompt(ctx.profile)
        ));
    };
    flow.draft.staff = Some(staff.name.clone());
    flow.step = CreateStep::DateSelection;
    FlowReply::stay(format!(
        "{} it is. {}",
        staff_display(&staff.name),
        date_prompt()
    ))
}

async fn date_selection(
    flow: &mut CreateFlow,
    ctx: &FlowContext<'_>,
    message: &str,
) -> anyhow::Result<FlowReply> {
    let Some(service) = flow.draft.service.clone() else {
        return Ok(restart(flow, ctx));
    };
    let Ok(date) = NaiveDate::parse_from_str(message.trim(), "%Y-%m-%d") else {
        return Ok(FlowReply::stay(format!(
            "I couldn't read that date. {}",
            date_prompt()
        )));
    };
    if ctx.profile.hours.periods_for(date).is_empty() {
        return Ok(FlowReply::stay(format!(
            "We're closed on {date}. Our hours are {}. {}",
            ctx.profile.hours.to_human_readable(),
            date_prompt()
        )));
    }

    let windows = ctx.free_windows_for(date, None, None).await?;
    if windows.is_empty() {
        return Ok(FlowReply::stay(format!(
            "We're fully booked on {date}. Could you pick another date?"
        )));
    }

    flow.draft.date = Some(date);
    flow.draft.clear_time();
    flow.step = CreateStep::TimeSelection;
    Ok(FlowReply::stay(format!(
        "Open times on {date}:\n{}\n\nSend your preferred window as HH:MM~HH:MM — a {service} takes {} minutes.",
        windows_list(&windows),
        ctx.profile.service_duration(&service)
    )))
}

async fn time_selection(
    flow: &mut CreateFlow,
    ctx: &FlowContext<'_>,
    message: &str,
) -> anyhow::Result<FlowReply> {
    let (Some(service), Some(date)) = (flow.draft.service.clone(), flow.draft.date) else {
        return Ok(restart(flow, ctx));
    };
    let Ok(requested) = TimeRange::parse(message.trim()) else {
        return Ok(FlowReply::stay(
            "Time windows need to look like HH:MM~HH:MM, e.g. 10:00~11:30. Could you try again?",
        ));
    };

    let duration = ctx.profile.service_duration(&service);
    let blocking = ctx.directory.list_blocking_intervals(date).await?;
    let periods = ctx.profile.hours.periods_for(date);
    let windows = availability::free_windows(date, &periods, &blocking, None, None);

    let chosen = match validate_user_range(requested, &windows, duration) {
        Ok(range) => range,
        Err(e) => {
            return Ok(FlowReply::stay(format!(
                "Sorry, {e}. Open times on {date}:\n{}",
                windows_list(&windows)
            )));
        }
    };

    let own = find_conflicts(&chosen, date, OwnerKind::Customer, ctx.user_id, &blocking, None);
    if !own.is_empty() {
        return Ok(FlowReply::stay(format!(
            "You already have a reservation at {} that day. Could you pick a different time?",
            describe_conflicts(&own)
        )));
    }
    if let Some(staff) = flow.draft.staff.as_deref().filter(|s| *s != UNASSIGNED_STAFF) {
        let busy = find_conflicts(&chosen, date, OwnerKind::Staff, staff, &blocking, None);
        if !busy.is_empty() {
            return Ok(FlowReply::stay(format!(
                "{staff} is already booked at {}. Could you pick a different time?",
                describe_conflicts(&busy)
            )));
        }
    }

    flow.draft.start = Some(chosen.start);
    flow.draft.end = Some(chosen.end);
    flow.step = CreateStep::Confirmation;

    let staff = flow.draft.staff.as_deref().unwrap_or(UNASSIGNED_STAFF);
    let price = ctx
        .profile
        .service_named(&service)
        .map(|s| s.price)
        .unwrap_or(0);
    Ok(FlowReply::stay(format!(
        "Here's what I have:\n\nDate: {date} {chosen}\nService: {service} ({duration} min)\nStaff: {}\nPrice: ${price}\n\nShall I confirm it? (yes/no)",
        staff_display(staff)
    )))
}

async fn confirmation(
    flow: &mut CreateFlow,
    ctx: &FlowContext<'_>,
    message: &str,
) -> anyhow::Result<FlowReply> {
    let keywords = &ctx.profile.keywords;
    if keywords.is_affirmative(message) {
        let draft = flow.draft.clone();
        let (Some(service), Some(staff), Some(date), Some(start), Some(end)) =
            (draft.service, draft.staff, draft.date, draft.start, draft.end)
        else {
            return Ok(restart(flow, ctx));
        };

        let id = ctx.directory.next_reservation_id(date).await?;
        let now = Utc::now().naive_utc();
        let reservation = Reservation {
            id: id.clone(),
            customer_id: ctx.user_id.to_string(),
            customer_name: None,
            service: service.clone(),
            staff: staff.clone(),
            date,
            start,
            end,
            status: ReservationStatus::Confirmed,
            created_at: now,
            updated_at: now,
        };

        let text = format!(
            "You're booked!\n\n{id}\n{date} {start}~{end} — {service} with {}\n\nSee you then!",
            staff_display(&staff)
        );
        return Ok(FlowReply::committed(text, SideEffect::Create(reservation)));
    }
    if keywords.is_negative(message) {
        return Ok(FlowReply::aborted(
            "No problem — nothing has been booked. Message us any time.",
        ));
    }
    Ok(FlowReply::stay(
        "Please reply \"yes\" to confirm or \"no\" to stop.",
    ))
}
