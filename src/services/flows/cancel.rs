use super::{reservation_list, select_reservation, staff_display, FlowContext, FlowReply, SideEffect};
use crate::models::{CancelFlow, CancelStep, Reservation};

pub fn opening_reply(candidates: &[Reservation]) -> String {
    format!(
        "Here are your upcoming reservations:\n\n{}\n\nSend the number (or the reservation id) of the one you'd like to cancel.",
        reservation_list(candidates)
    )
}

pub async fn advance(
    flow: &mut CancelFlow,
    ctx: &FlowContext<'_>,
    message: &str,
) -> anyhow::Result<FlowReply> {
    match flow.step {
        CancelStep::ReservationLookup => Ok(lookup(flow, message)),
        CancelStep::Confirm => Ok(confirm(flow, ctx, message)),
    }
}

fn lookup(flow: &mut CancelFlow, message: &str) -> FlowReply {
    let Some(target) = select_reservation(&flow.candidates, message).cloned() else {
        return FlowReply::stay(format!(
            "I couldn't match that to one of your reservations.\n\n{}\n\nSend the number or the reservation id.",
            reservation_list(&flow.candidates)
        ));
    };
    flow.step = CancelStep::Confirm;
    let text = format!(
        "Cancel your {} with {} on {} {} ({})? (yes/no)",
        target.service,
        staff_display(&target.staff),
        target.date,
        target.range(),
        target.id
    );
    flow.target = Some(target);
    FlowReply::stay(text)
}

fn confirm(flow: &mut CancelFlow, ctx: &FlowContext<'_>, message: &str) -> FlowReply {
    let keywords = &ctx.profile.keywords;
    if keywords.is_affirmative(message) {
        let Some(target) = flow.target.clone() else {
            flow.step = CancelStep::ReservationLookup;
            return FlowReply::stay(format!(
                "Something went wrong on our side, let's start again.\n\n{}",
                opening_reply(&flow.candidates)
            ));
        };
        let text = format!(
            "Your reservation {} is cancelled. We hope to see you again soon!",
            target.id
        );
        return FlowReply::committed(
            text,
            SideEffect::Cancel {
                reservation_id: target.id,
            },
        );
    }
    if keywords.is_negative(message) {
        return FlowReply::aborted("Okay, your reservation is unchanged.");
    }
    FlowReply::stay("Please reply \"yes\" to cancel it or \"no\" to keep it.")
}
