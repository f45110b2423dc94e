//! Lazy per-element invocation behind `invoke_range` and `invoke_each`.

use core::iter::{Enumerate, FusedIterator};
use core::panic::Location;
use std::sync::Arc;

use crate::action::{ActionToken, TryAction};
use crate::callable::{capture, ActionOutput, ArgFactories, CallableMut};

/// Lazy sequence of [`TryAction`]s, one per element of the source.
///
/// Built by [`TryAction::invoke_range`]. Nothing runs until the iterator is
/// advanced; each step runs the argument factories and then the action for
/// exactly one element. A failing element does not stop the sequence.
#[must_use = "iterators are lazy and do nothing unless consumed"]
pub struct InvokeRange<I, F, Fs> {
    items: Enumerate<I>,
    action: F,
    factories: Fs,
    cause: Option<Arc<str>>,
    site: &'static Location<'static>,
    token: ActionToken,
}

impl<I, F, Fs> InvokeRange<I, F, Fs>
where
    I: Iterator,
    Fs: ArgFactories<I::Item>,
    F: CallableMut<Fs::Args>,
{
    pub(crate) fn new(
        items: I,
        action: F,
        factories: Fs,
        cause: Option<Arc<str>>,
        site: &'static Location<'static>,
    ) -> Self {
        let token = ActionToken::from_identity(CallableMut::identity(&action));
        Self {
            items: items.enumerate(),
            action,
            factories,
            cause,
            site,
            token,
        }
    }
}

impl<I, F, Fs> Iterator for InvokeRange<I, F, Fs>
where
    I: Iterator,
    Fs: ArgFactories<I::Item>,
    F: CallableMut<Fs::Args>,
    F::Output: ActionOutput,
{
    type Item = TryAction;

    fn next(&mut self) -> Option<TryAction> {
        let (index, item) = self.items.next()?;
        let action = &mut self.action;
        let factories = &mut self.factories;
        let outcome = capture(move || {
            let args = factories.produce(index, item);
            CallableMut::call_mut(action, args)?.into_outcome()
        });
        Some(TryAction::lift(outcome, self.token, self.cause.clone(), self.site))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.items.size_hint()
    }
}

impl<I, F, Fs> ExactSizeIterator for InvokeRange<I, F, Fs>
where
    I: ExactSizeIterator,
    Fs: ArgFactories<I::Item>,
    F: CallableMut<Fs::Args>,
    F::Output: ActionOutput,
{
}

impl<I, F, Fs> FusedIterator for InvokeRange<I, F, Fs>
where
    I: FusedIterator,
    Fs: ArgFactories<I::Item>,
    F: CallableMut<Fs::Args>,
    F::Output: ActionOutput,
{
}
