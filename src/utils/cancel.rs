//! Join-or-cancel for the concurrent steps of a quality cell

use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::domain::errors::DomainError;

/// Run `fut` inside the cancellation scope of `token`.
///
/// Resolves to `Cancelled` as soon as the scope is cancelled, dropping `fut`
/// (and with it any child process it owns). An error from `fut` cancels the
/// scope for every sibling.
pub async fn guarded<T, F>(token: &CancellationToken, fut: F) -> Result<T, DomainError>
where
    F: Future<Output = Result<T, DomainError>>,
{
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(DomainError::Cancelled),
        result = fut => {
            if result.is_err() {
                token.cancel();
            }
            result
        }
    }
}

/// Run three fallible futures concurrently under one cancellation scope.
///
/// All three are awaited. The first failure cancels the other two and is the
/// error returned; siblings that were cancelled because of it report
/// `Cancelled` and are ignored.
pub async fn join3_or_cancel<A, B, C, FA, FB, FC>(
    token: &CancellationToken,
    a: FA,
    b: FB,
    c: FC,
) -> Result<(A, B, C), DomainError>
where
    FA: Future<Output = Result<A, DomainError>>,
    FB: Future<Output = Result<B, DomainError>>,
    FC: Future<Output = Result<C, DomainError>>,
{
    let (ra, rb, rc) = tokio::join!(guarded(token, a), guarded(token, b), guarded(token, c));

    match (ra, rb, rc) {
        (Ok(a), Ok(b), Ok(c)) => Ok((a, b, c)),
        (ra, rb, rc) => Err(first_failure([ra.err(), rb.err(), rc.err()])),
    }
}

/// Once a scope is cancelled every later sibling resolves to `Cancelled`, so
/// at most one non-cancelled error exists and it is the one that fired first.
fn first_failure<const N: usize>(errors: [Option<DomainError>; N]) -> DomainError {
    let mut cancelled = None;
    for err in errors.into_iter().flatten() {
        if err.is_cancelled() {
            cancelled = Some(err);
        } else {
            return err;
        }
    }
    cancelled.unwrap_or(DomainError::Cancelled)
}
