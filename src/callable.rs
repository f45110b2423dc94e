//! Argument lists for user callables and the capture boundary around them.
//!
//! Instead of one entry point per arity, a callable of N arguments receives
//! its arguments as an N-tuple: `()` for none, `(a,)` for one, `(a, b)` for
//! two, and so on up to sixteen.

use core::hash::{Hash, Hasher};
use std::collections::hash_map::DefaultHasher;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::error::{Error, Fault};

// ============================================================
// Callable
// ============================================================

/// Something that can be called with an argument tuple `Args`.
///
/// Implemented for every `FnOnce` taking up to sixteen arguments and for
/// `Option<C>`, where `None` stands for a callable that was never supplied.
pub trait Callable<Args> {
    /// What the callable returns.
    type Output;

    /// Call with the given arguments.
    ///
    /// Fails only when the callable itself is missing.
    fn call(self, args: Args) -> Result<Self::Output, Error>;

    /// Identity of this callable, the basis of action tokens.
    ///
    /// Defaults to the callable's type, which is unique per closure and per
    /// function item. Function pointers and boxed or borrowed `dyn Fn*`
    /// objects all share a type per signature, so they hash the pointer they
    /// hold instead.
    fn identity(&self) -> u64 {
        identity_of::<Self>()
    }
}

impl<C, Args> Callable<Args> for Option<C>
where
    C: Callable<Args>,
{
    type Output = C::Output;

    #[inline]
    fn call(self, args: Args) -> Result<Self::Output, Error> {
        match self {
            Some(callable) => callable.call(args),
            None => Err(Fault::Missing("callable").into()),
        }
    }

    fn identity(&self) -> u64 {
        match self {
            Some(callable) => Callable::identity(callable),
            None => identity_of::<Self>(),
        }
    }
}

/// Something that can be called repeatedly with an argument tuple `Args`.
///
/// The `FnMut` counterpart of [`Callable`], used where one action runs once
/// per element of a sequence.
pub trait CallableMut<Args> {
    /// What the callable returns.
    type Output;

    /// Call with the given arguments.
    fn call_mut(&mut self, args: Args) -> Result<Self::Output, Error>;

    /// Identity of this callable; see [`Callable::identity`].
    fn identity(&self) -> u64 {
        identity_of::<Self>()
    }
}

impl<C, Args> CallableMut<Args> for Option<C>
where
    C: CallableMut<Args>,
{
    type Output = C::Output;

    #[inline]
    fn call_mut(&mut self, args: Args) -> Result<Self::Output, Error> {
        match self {
            Some(callable) => callable.call_mut(args),
            None => Err(Fault::Missing("callable").into()),
        }
    }

    fn identity(&self) -> u64 {
        match self {
            Some(callable) => CallableMut::identity(callable),
            None => identity_of::<Self>(),
        }
    }
}

// Tries each pointer-like candidate type in turn; falls back to the type.
macro_rules! pointer_identity {
    (
        $callable:expr,
        pointer $pointer:ty,
        boxed [$($boxed:ty),*],
        borrowed [$($borrowed:ty),*],
        borrowed_mut [$($borrowed_mut:ty),*]
    ) => {{
        let callable = $callable;
        identity_as::<_, $pointer, _, _>(callable, |f| *f as *const ())
            $(.or_else(|| identity_as::<_, Box<$boxed>, _, _>(callable, |b| raw(&**b))))*
            $(.or_else(|| identity_as::<_, &$borrowed, _, _>(callable, |r| raw(*r))))*
            $(.or_else(|| identity_as::<_, &mut $borrowed_mut, _, _>(callable, |r| raw(&**r))))*
            .unwrap_or_else(identity_of::<Self>)
    }};
}

macro_rules! impl_callable {
    ($(($($arg:ident),*)),* $(,)?) => {
        $(
            impl<Func, Ret, $($arg),*> Callable<($($arg,)*)> for Func
            where
                Func: FnOnce($($arg),*) -> Ret,
            {
                type Output = Ret;

                #[inline]
                #[allow(non_snake_case)]
                fn call(self, ($($arg,)*): ($($arg,)*)) -> Result<Ret, Error> {
                    Ok(self($($arg),*))
                }

                fn identity(&self) -> u64 {
                    pointer_identity!(
                        self,
                        pointer fn($($arg),*) -> Ret,
                        boxed [
                            dyn FnOnce($($arg),*) -> Ret,
                            dyn FnOnce($($arg),*) -> Ret + Send,
                            dyn FnMut($($arg),*) -> Ret,
                            dyn FnMut($($arg),*) -> Ret + Send,
                            dyn Fn($($arg),*) -> Ret,
                            dyn Fn($($arg),*) -> Ret + Send,
                            dyn Fn($($arg),*) -> Ret + Send + Sync
                        ],
                        borrowed [
                            dyn Fn($($arg),*) -> Ret,
                            dyn Fn($($arg),*) -> Ret + Send,
                            dyn Fn($($arg),*) -> Ret + Sync,
                            dyn Fn($($arg),*) -> Ret + Send + Sync
                        ],
                        borrowed_mut [
                            dyn FnMut($($arg),*) -> Ret,
                            dyn FnMut($($arg),*) -> Ret + Send
                        ]
                    )
                }
            }

            impl<Func, Ret, $($arg),*> CallableMut<($($arg,)*)> for Func
            where
                Func: FnMut($($arg),*) -> Ret,
            {
                type Output = Ret;

                #[inline]
                #[allow(non_snake_case)]
                fn call_mut(&mut self, ($($arg,)*): ($($arg,)*)) -> Result<Ret, Error> {
                    Ok(self($($arg),*))
                }

                fn identity(&self) -> u64 {
                    pointer_identity!(
                        self,
                        pointer fn($($arg),*) -> Ret,
                        boxed [
                            dyn FnMut($($arg),*) -> Ret,
                            dyn FnMut($($arg),*) -> Ret + Send,
                            dyn Fn($($arg),*) -> Ret,
                            dyn Fn($($arg),*) -> Ret + Send,
                            dyn Fn($($arg),*) -> Ret + Send + Sync
                        ],
                        borrowed [
                            dyn Fn($($arg),*) -> Ret,
                            dyn Fn($($arg),*) -> Ret + Send,
                            dyn Fn($($arg),*) -> Ret + Sync,
                            dyn Fn($($arg),*) -> Ret + Send + Sync
                        ],
                        borrowed_mut [
                            dyn FnMut($($arg),*) -> Ret,
                            dyn FnMut($($arg),*) -> Ret + Send
                        ]
                    )
                }
            }
        )*
    };
}

impl_callable!(
    (),
    (A1),
    (A1, A2),
    (A1, A2, A3),
    (A1, A2, A3, A4),
    (A1, A2, A3, A4, A5),
    (A1, A2, A3, A4, A5, A6),
    (A1, A2, A3, A4, A5, A6, A7),
    (A1, A2, A3, A4, A5, A6, A7, A8),
    (A1, A2, A3, A4, A5, A6, A7, A8, A9),
    (A1, A2, A3, A4, A5, A6, A7, A8, A9, A10),
    (A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11),
    (A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11, A12),
    (A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11, A12, A13),
    (A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11, A12, A13, A14),
    (A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11, A12, A13, A14, A15),
    (A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11, A12, A13, A14, A15, A16),
);

// ============================================================
// ActionOutput - what an action may return
// ============================================================

/// Return types accepted from an action: `()` or `Result<(), E>`.
pub trait ActionOutput {
    /// Normalize into a `Result`.
    fn into_outcome(self) -> Result<(), Error>;
}

impl ActionOutput for () {
    #[inline]
    fn into_outcome(self) -> Result<(), Error> {
        Ok(())
    }
}

impl<E: Into<Error>> ActionOutput for Result<(), E> {
    #[inline]
    fn into_outcome(self) -> Result<(), Error> {
        self.map_err(Into::into)
    }
}

// ============================================================
// ArgFactories - per-element argument producers for invoke_range
// ============================================================

/// Produces the argument tuple for one element of an `invoke_range`.
///
/// The element itself is always the first argument. Every further position
/// comes from a factory `FnMut(usize) -> X` called with the element's index.
/// Factories run left to right, once per element.
pub trait ArgFactories<Item> {
    /// The full argument tuple, element first.
    type Args;

    /// Build the arguments for the element at `index`.
    fn produce(&mut self, index: usize, item: Item) -> Self::Args;
}

impl<Item> ArgFactories<Item> for () {
    type Args = (Item,);

    #[inline]
    fn produce(&mut self, _index: usize, item: Item) -> (Item,) {
        (item,)
    }
}

macro_rules! impl_arg_factories {
    ($(($($factory:ident => $arg:ident),+)),* $(,)?) => {
        $(
            impl<Item, $($factory, $arg),+> ArgFactories<Item> for ($($factory,)+)
            where
                $($factory: FnMut(usize) -> $arg),+
            {
                type Args = (Item, $($arg,)+);

                #[inline]
                #[allow(non_snake_case)]
                fn produce(&mut self, index: usize, item: Item) -> Self::Args {
                    let ($($factory,)+) = self;
                    (item, $($factory(index),)+)
                }
            }
        )*
    };
}

impl_arg_factories!(
    (F2 => A2),
    (F2 => A2, F3 => A3),
    (F2 => A2, F3 => A3, F4 => A4),
    (F2 => A2, F3 => A3, F4 => A4, F5 => A5),
    (F2 => A2, F3 => A3, F4 => A4, F5 => A5, F6 => A6),
    (F2 => A2, F3 => A3, F4 => A4, F5 => A5, F6 => A6, F7 => A7),
    (F2 => A2, F3 => A3, F4 => A4, F5 => A5, F6 => A6, F7 => A7, F8 => A8),
    (F2 => A2, F3 => A3, F4 => A4, F5 => A5, F6 => A6, F7 => A7, F8 => A8, F9 => A9),
    (F2 => A2, F3 => A3, F4 => A4, F5 => A5, F6 => A6, F7 => A7, F8 => A8, F9 => A9,
     F10 => A10),
    (F2 => A2, F3 => A3, F4 => A4, F5 => A5, F6 => A6, F7 => A7, F8 => A8, F9 => A9,
     F10 => A10, F11 => A11),
    (F2 => A2, F3 => A3, F4 => A4, F5 => A5, F6 => A6, F7 => A7, F8 => A8, F9 => A9,
     F10 => A10, F11 => A11, F12 => A12),
    (F2 => A2, F3 => A3, F4 => A4, F5 => A5, F6 => A6, F7 => A7, F8 => A8, F9 => A9,
     F10 => A10, F11 => A11, F12 => A12, F13 => A13),
    (F2 => A2, F3 => A3, F4 => A4, F5 => A5, F6 => A6, F7 => A7, F8 => A8, F9 => A9,
     F10 => A10, F11 => A11, F12 => A12, F13 => A13, F14 => A14),
    (F2 => A2, F3 => A3, F4 => A4, F5 => A5, F6 => A6, F7 => A7, F8 => A8, F9 => A9,
     F10 => A10, F11 => A11, F12 => A12, F13 => A13, F14 => A14, F15 => A15),
    (F2 => A2, F3 => A3, F4 => A4, F5 => A5, F6 => A6, F7 => A7, F8 => A8, F9 => A9,
     F10 => A10, F11 => A11, F12 => A12, F13 => A13, F14 => A14, F15 => A15, F16 => A16),
);

// ============================================================
// Capture boundary
// ============================================================

/// Run `body`, turning both `Err` and panics into an `Error`.
#[inline]
pub(crate) fn capture<T, F>(body: F) -> Result<T, Error>
where
    F: FnOnce() -> Result<T, Error>,
{
    match catch_unwind(AssertUnwindSafe(body)) {
        Ok(result) => result,
        Err(payload) => Err(Error::from_panic(payload)),
    }
}

/// Call a fallible callable inside the capture boundary.
#[inline]
pub(crate) fn attempt<C, Args, T, E>(callable: C, args: Args) -> Result<T, Error>
where
    C: Callable<Args, Output = Result<T, E>>,
    E: Into<Error>,
{
    capture(move || callable.call(args)?.map_err(Into::into))
}

/// Stable identity of a callable, derived from its type.
///
/// Every closure has its own type, so two invocations of the same closure
/// share a token while two different closures do not. Lifetimes are erased,
/// closures borrowing from the stack are fine.
pub(crate) fn identity_of<C: ?Sized>() -> u64 {
    let mut hasher = DefaultHasher::new();
    typeid::of::<C>().hash(&mut hasher);
    hasher.finish()
}

/// Identity of `callable` through `view`, if `Func` is `Candidate`.
///
/// The hash covers the type and whatever `view` extracts from the value.
#[allow(unsafe_code)]
fn identity_as<Func, Candidate, P, V>(callable: &Func, view: V) -> Option<u64>
where
    V: FnOnce(&Candidate) -> P,
    P: Hash,
{
    if typeid::of::<Func>() != typeid::of::<Candidate>() {
        return None;
    }
    // SAFETY: equal type ids mean `Func` and `Candidate` differ at most in
    // lifetimes, so they share one layout and the reference stays valid for
    // the duration of the borrow of `callable`.
    let candidate = unsafe { &*(callable as *const Func).cast::<Candidate>() };
    let mut hasher = DefaultHasher::new();
    typeid::of::<Func>().hash(&mut hasher);
    view(candidate).hash(&mut hasher);
    Some(hasher.finish())
}

// Raw pointer with its metadata, so two trait objects differing only in
// vtable hash apart.
#[inline]
fn raw<T: ?Sized>(r: &T) -> *const T {
    r
}
