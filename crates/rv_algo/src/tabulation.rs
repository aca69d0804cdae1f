//! Modified Borda Count tabulation.
//!
//! Votes are grouped by attachment with an identity-keyed pass; a rank r in
//! 1..=m contributes (m − r) Borda points, so first place earns m−1 and last
//! place earns 0. The tally map always contains every attachment of the
//! event, including voteless ones (zero points, zero votes — they must still
//! appear in the ranking, below anything with points).

use rv_core::entities::Vote;
use rv_core::errors::Error;
use rv_core::ids::AttachmentId;

use crate::{MbcTally, TallyMap};

/// Tabulate Borda points per attachment.
///
/// `attachments` is the full set F of the event; `votes` are all committed
/// vote rows. Rejects a vote for an id outside F (`cross_event_attachment`
/// — the intake validator makes this unreachable in practice) and a rank
/// outside 1..=m.
pub fn tabulate_mbc(
    m: u32,
    attachments: &[AttachmentId],
    votes: &[Vote],
) -> Result<TallyMap, Error> {
    let mut tallies: TallyMap = attachments
        .iter()
        .map(|id| (id.clone(), MbcTally::default()))
        .collect();

    for vote in votes {
        if vote.rank_position == 0 || vote.rank_position > m {
            return Err(Error::Internal(format!(
                "vote {} has rank {} outside 1..={m}",
                vote.id, vote.rank_position
            )));
        }
        let Some(t) = tallies.get_mut(&vote.attachment) else {
            return Err(Error::CrossEventAttachment {
                attachment: vote.attachment.to_string(),
                event: vote.event.to_string(),
            });
        };
        t.points += (m - vote.rank_position) as u64;
        t.vote_count += 1;
        t.rank_sum += vote.rank_position as u64;
    }

    Ok(tallies)
}
