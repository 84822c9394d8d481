use chrono::NaiveDate;

use super::{
    reservation_list, select_reservation, staff_display, windows_list, FlowContext, FlowReply,
    SideEffect,
};
use crate::models::catalog::contains_phrase;
use crate::models::{
    ModificationChanges, ModifyField, ModifyFlow, ModifyStep, OwnerKind, Reservation, TimeRange,
    UNASSIGNED_STAFF,
};
use crate::services::availability::{self, validate_user_range};
use crate::services::conflict::{describe_conflicts, find_conflicts};

pub fn opening_reply(candidates: &[Reservation]) -> String {
    format!(
        "Here are your upcoming reservations:\n\n{}\n\nSend the number (or the reservation id) of the one you'd like to change.",
        reservation_list(candidates)
    )
}

pub async fn advance(
    flow: &mut ModifyFlow,
    ctx: &FlowContext<'_>,
    message: &str,
) -> anyhow::Result<FlowReply> {
    match flow.step {
        ModifyStep::ReservationLookup => Ok(lookup(flow, message)),
        ModifyStep::FieldChoice => Ok(field_choice(flow, ctx, message)),
        ModifyStep::DateChoice => date_choice(flow, ctx, message).await,
        ModifyStep::TimeWindowChoice => time_window_choice(flow, ctx, message).await,
        ModifyStep::ServiceChoice => service_choice(flow, ctx, message).await,
        ModifyStep::StaffChoice => staff_choice(flow, ctx, message).await,
        ModifyStep::Confirm => Ok(confirm(flow, ctx, message)),
    }
}

/// Keep the original staff's bookings blocking only when the staff member
/// is actually assigned; "unassigned" slots block every chair anyway.
fn staff_filter(target: &Reservation) -> Option<&str> {
    (target.staff != UNASSIGNED_STAFF).then_some(target.staff.as_str())
}

/// Scratch state we rely on is missing; the only safe move is back to the
/// reservation list.
fn rewind_to_lookup(flow: &mut ModifyFlow) -> FlowReply {
    flow.target = None;
    flow.field = None;
    flow.new_date = None;
    flow.new_range = None;
    flow.new_service = None;
    flow.new_staff = None;
    flow.step = ModifyStep::ReservationLookup;
    FlowReply::stay(format!(
        "Something went wrong on our side, let's start again.\n\n{}",
        opening_reply(&flow.candidates)
    ))
}

fn lookup(flow: &mut ModifyFlow, message: &str) -> FlowReply {
    let Some(target) = select_reservation(&flow.candidates, message).cloned() else {
        return FlowReply::stay(format!(
            "I couldn't match that to one of your reservations.\n\n{}\n\nSend the number or the reservation id.",
            reservation_list(&flow.candidates)
        ));
    };
    flow.step = ModifyStep::FieldChoice;
    let text = format!(
        "Changing your {} with {} on {} {}. What would you like to change — the time, the service, or the staff?",
        target.service,
        staff_display(&target.staff),
        target.date,
        target.range()
    );
    flow.target = Some(target);
    FlowReply::stay(text)
}

fn field_choice(flow: &mut ModifyFlow, ctx: &FlowContext<'_>, message: &str) -> FlowReply {
    let Some(target) = flow.target.clone() else {
        return rewind_to_lookup(flow);
    };
    if contains_phrase(message, "time") || contains_phrase(message, "date") {
        flow.field = Some(ModifyField::Time);
        flow.step = ModifyStep::DateChoice;
        FlowReply::stay(format!(
            "What date would you like? Send it as YYYY-MM-DD (your current booking is on {}).",
            target.date
        ))
    } else if contains_phrase(message, "service") {
        flow.field = Some(ModifyField::Service);
        flow.step = ModifyStep::ServiceChoice;
        FlowReply::stay(format!(
            "Which service instead of {}?\n\n{}",
            target.service,
            ctx.profile.service_menu()
        ))
    } else if contains_phrase(message, "staff") {
        flow.field = Some(ModifyField::Staff);
        flow.step = ModifyStep::StaffChoice;
        FlowReply::stay(format!(
            "Who would you like instead of {}?\n\n{}",
            staff_display(&target.staff),
            ctx.profile.staff_menu()
        ))
    } else {
        FlowReply::stay("Send \"time\", \"service\", or \"staff\" to pick what to change.")
    }
}

async fn date_choice(
    flow: &mut ModifyFlow,
    ctx: &FlowContext<'_>,
    message: &str,
) -> anyhow::Result<FlowReply> {
    let Some(target) = flow.target.clone() else {
        return Ok(rewind_to_lookup(flow));
    };
    let Ok(date) = NaiveDate::parse_from_str(message.trim(), "%Y-%m-%d") else {
        return Ok(FlowReply::stay(
            "I couldn't read that date. Send it as YYYY-MM-DD, e.g. 2025-02-03.",
        ));
    };
    if ctx.profile.hours.periods_for(date).is_empty() {
        return Ok(FlowReply::stay(format!(
            "We're closed on {date}. Our hours are {}.",
            ctx.profile.hours.to_human_readable()
        )));
    }

    // The slot being edited reads as free, so keeping the original time is
    // still on offer.
    let windows = ctx
        .free_windows_for(date, staff_filter(&target), Some(&target.id))
        .await?;
    if windows.is_empty() {
        return Ok(FlowReply::stay(format!(
            "No openings on {date}. Could you pick another date?"
        )));
    }

    flow.new_date = Some(date);
    flow.new_range = None;
    flow.step = ModifyStep::TimeWindowChoice;
    Ok(FlowReply::stay(format!(
        "Open times on {date}:\n{}\n\nSend your new window as HH:MM~HH:MM — a {} takes {} minutes.",
        windows_list(&windows),
        target.service,
        ctx.profile.service_duration(&target.service)
    )))
}

async fn time_window_choice(
    flow: &mut ModifyFlow,
    ctx: &FlowContext<'_>,
    message: &str,
) -> anyhow::Result<FlowReply> {
    let (Some(target), Some(date)) = (flow.target.clone(), flow.new_date) else {
        return Ok(rewind_to_lookup(flow));
    };
    let Ok(requested) = TimeRange::parse(message.trim()) else {
        return Ok(FlowReply::stay(
            "Time windows need to look like HH:MM~HH:MM, e.g. 10:00~11:30. Could you try again?",
        ));
    };

    let duration = ctx.profile.service_duration(&target.service);
    let blocking = ctx.directory.list_blocking_intervals(date).await?;
    let periods = ctx.profile.hours.periods_for(date);
    let windows = availability::free_windows(
        date,
        &periods,
        &blocking,
        staff_filter(&target),
        Some(&target.id),
    );

    let chosen = match validate_user_range(requested, &windows, duration) {
        Ok(range) => range,
        Err(e) => {
            return Ok(FlowReply::stay(format!(
                "Sorry, {e}. Open times on {date}:\n{}",
                windows_list(&windows)
            )));
        }
    };

    let own = find_conflicts(
        &chosen,
        date,
        OwnerKind::Customer,
        ctx.user_id,
        &blocking,
        Some(&target.id),
    );
    if !own.is_empty() {
        return Ok(FlowReply::stay(format!(
            "That would overlap your other reservation at {}. Could you pick a different time?",
            describe_conflicts(&own)
        )));
    }

    flow.new_range = Some(chosen);
    flow.step = ModifyStep::Confirm;
    Ok(FlowReply::stay(format!(
        "Move your {} from {} {} to {date} {chosen}? (yes/no)",
        target.service,
        target.date,
        target.range()
    )))
}

async fn service_choice(
    flow: &mut ModifyFlow,
    ctx: &FlowContext<'_>,
    message: &str,
) -> anyhow::Result<FlowReply> {
    let Some(target) = flow.target.clone() else {
        return Ok(rewind_to_lookup(flow));
    };
    let Some(service) = ctx.profile.find_service(message).cloned() else {
        return Ok(FlowReply::stay(format!(
            "We don't offer that one. Which service instead?\n\n{}",
            ctx.profile.service_menu()
        )));
    };

    // A different service means a different duration: the booking keeps its
    // start time and the end moves.
    let duration = service.duration_minutes;
    let Some(new_end) = target.start.add_minutes(duration) else {
        return Ok(FlowReply::stay(format!(
            "A {} ({duration} min) starting at {} would run past closing. Pick another service, or change the time first.",
            service.name, target.start
        )));
    };
    let candidate = TimeRange::new(target.start, new_end);

    let blocking = ctx.directory.list_blocking_intervals(target.date).await?;
    let periods = ctx.profile.hours.periods_for(target.date);
    let windows = availability::free_windows(
        target.date,
        &periods,
        &blocking,
        staff_filter(&target),
        Some(&target.id),
    );
    if validate_user_range(candidate, &windows, duration).is_err() {
        return Ok(FlowReply::stay(format!(
            "A {} runs {duration} minutes and doesn't fit your current slot on {}. Pick another service, or change the time first.",
            service.name, target.date
        )));
    }

    let own = find_conflicts(
        &candidate,
        target.date,
        OwnerKind::Customer,
        ctx.user_id,
        &blocking,
        Some(&target.id),
    );
    if !own.is_empty() {
        return Ok(FlowReply::stay(format!(
            "That would overlap your other reservation at {}. Pick another service, or change the time first.",
            describe_conflicts(&own)
        )));
    }

    flow.new_service = Some(service.name.clone());
    flow.new_range = Some(candidate);
    flow.step = ModifyStep::Confirm;
    Ok(FlowReply::stay(format!(
        "Change your {} to a {} on {} (new time {candidate})? (yes/no)",
        target.service, service.name, target.date
    )))
}

async fn staff_choice(
    flow: &mut ModifyFlow,
    ctx: &FlowContext<'_>,
    message: &str,
) -> anyhow::Result<FlowReply> {
    let Some(target) = flow.target.clone() else {
        return Ok(rewind_to_lookup(flow));
    };
    let Some(staff) = ctx.profile.find_staff(message).cloned() else {
        return Ok(FlowReply::stay(format!(
            "We don't have anyone by that name. Who would you like?\n\n{}",
            ctx.profile.staff_menu()
        )));
    };

    if !staff.is_unassigned() {
        let blocking = ctx.directory.list_blocking_intervals(target.date).await?;
        let busy = find_conflicts(
            &target.range(),
            target.date,
            OwnerKind::Staff,
            &staff.name,
            &blocking,
            Some(&target.id),
        );
        if !busy.is_empty() {
            return Ok(FlowReply::stay(format!(
                "{} is already booked at {} then. Could you pick someone else?",
                staff.name,
                describe_conflicts(&busy)
            )));
        }
    }

    flow.new_staff = Some(staff.name.clone());
    flow.step = ModifyStep::Confirm;
    Ok(FlowReply::stay(format!(
        "Reassign your {} on {} {} from {} to {}? (yes/no)",
        target.service,
        target.date,
        target.range(),
        staff_display(&target.staff),
        staff_display(&staff.name)
    )))
}

fn confirm(flow: &mut ModifyFlow, ctx: &FlowContext<'_>, message: &str) -> FlowReply {
    let keywords = &ctx.profile.keywords;
    if keywords.is_affirmative(message) {
        let Some(target) = flow.target.clone() else {
            return rewind_to_lookup(flow);
        };
        let changes = ModificationChanges {
            date: flow.new_date,
            start: flow.new_range.map(|r| r.start),
            end: flow.new_range.map(|r| r.end),
            service: flow.new_service.clone(),
            staff: flow.new_staff.clone(),
        };
        if changes.is_empty() {
            return rewind_to_lookup(flow);
        }
        let text = format!("Done! Reservation {} has been updated.", target.id);
        return FlowReply::committed(
            text,
            SideEffect::Modify {
                reservation_id: target.id,
                changes,
            },
        );
    }
    if keywords.is_negative(message) {
        return FlowReply::aborted("Okay, I've left your reservation as it was.");
    }
    FlowReply::stay("Please reply \"yes\" to apply the change or \"no\" to leave it as is.")
}
