use crate::middleware::AuthenticatedUser;

/// Outcome of an edit/delete request against an authored object.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationDecision {
    Proceed,
    /// Someone other than the author asked; send them to the object instead.
    Redirect(String),
}

/// Only the author may mutate. Everyone else is quietly redirected to
/// `detail_url` with no error status. The author is read from the row on
/// every request, never cached in the session.
pub fn authorize_mutation(
    requester: &AuthenticatedUser,
    author_id: i64,
    detail_url: String,
) -> MutationDecision {
    if requester.id == author_id {
        MutationDecision::Proceed
    } else {
        log::info!(
            "User '{}' tried to modify an object owned by user {}; redirecting to {}",
            requester.username, author_id, detail_url
        );
        MutationDecision::Redirect(detail_url)
    }
}
