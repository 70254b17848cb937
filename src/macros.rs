//! Declaration and registration macros.

/// Declares a customization point as a lazily built static, together with
/// its identity tag type.
///
/// The optional closure configures the [`PointBuilder`](crate::PointBuilder).
/// A point that fails to build panics on first use with the build error.
///
/// # Examples
///
/// ```
/// use u_dispatch::customization_point;
///
/// customization_point! {
///     /// Renders a value as text.
///     pub static RENDER: Render = "render", |point| point
///         .fallback_fn("display_i32", |(n,): (i32,)| n.to_string())
/// }
///
/// assert_eq!(RENDER.call::<String, _>((5i32,)).unwrap(), "5");
/// ```
#[macro_export]
macro_rules! customization_point {
    (
        $(#[$meta:meta])*
        $vis:vis static $name:ident : $tag:ident = $label:literal $(, $configure:expr)? $(;)?
    ) => {
        #[doc = concat!("Identity tag of [`", stringify!($name), "`].")]
        #[derive(Debug, Clone, Copy)]
        $vis struct $tag;

        $(#[$meta])*
        $vis static $name: ::std::sync::LazyLock<$crate::CustomizationPoint> =
            ::std::sync::LazyLock::new(|| {
                let builder = $crate::CustomizationPoint::builder::<$tag>($label);
                $(
                    let configure: fn($crate::PointBuilder) -> $crate::PointBuilder = $configure;
                    let builder = configure(builder);
                )?
                match builder.build() {
                    ::core::result::Result::Ok(point) => point,
                    ::core::result::Result::Err(err) => {
                        panic!("failed to build customization point `{}`: {}", $label, err)
                    }
                }
            });
    };
}

/// Registers an implementation owned by the first argument's type.
///
/// ```ignore
/// register_member!(ForEach, fn bag_for_each(bag: Bag, f: Visit<i64>) -> usize {
///     bag.items.iter().inspect(|x| f(x)).count()
/// });
/// ```
#[macro_export]
macro_rules! register_member {
    ($point:ty, fn $name:ident ( $($arg:ident : $ty:ty),+ $(,)? ) -> $ret:ty $body:block) => {
        $crate::__register_impl!(
            MEMBER_IMPLS,
            $point,
            ::core::option::Option::None,
            fn $name($($arg: $ty),+) -> $ret $body
        );
    };
}

/// Registers a free implementation.
///
/// Without a scope the implementation lives next to the point. With a scope
/// type, it is found through that argument type, which must be one of its
/// parameters.
///
/// ```ignore
/// register_free!(ForEach, fn words(text: String, f: Visit<String>) -> usize { .. });
/// register_free!(ForEach, Grid, fn grid(grid: Grid, f: Visit<f64>) -> usize { .. });
/// ```
#[macro_export]
macro_rules! register_free {
    ($point:ty, fn $name:ident ( $($arg:ident : $ty:ty),+ $(,)? ) -> $ret:ty $body:block) => {
        $crate::__register_impl!(
            FREE_IMPLS,
            $point,
            ::core::option::Option::None,
            fn $name($($arg: $ty),+) -> $ret $body
        );
    };
    ($point:ty, $scope:ty, fn $name:ident ( $($arg:ident : $ty:ty),+ $(,)? ) -> $ret:ty $body:block) => {
        $crate::__register_impl!(
            FREE_IMPLS,
            $point,
            ::core::option::Option::Some($crate::TypeTag::of::<$scope>),
            fn $name($($arg: $ty),+) -> $ret $body
        );
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __register_impl {
    (
        $slice:ident,
        $point:ty,
        $scope:expr,
        fn $name:ident ( $($arg:ident : $ty:ty),+ ) -> $ret:ty $body:block
    ) => {
        const _: () = {
            fn $name($($arg: $ty),+) -> $ret $body

            fn __thunk(
                args: $crate::ArgPack,
            ) -> ::core::result::Result<$crate::Value, $crate::DispatchError> {
                let ($($arg,)+) = <($($ty,)+) as $crate::FromArgs>::from_args(args)?;
                ::core::result::Result::Ok($crate::Value::new($name($($arg),+)))
            }

            #[$crate::linkme::distributed_slice($crate::registry::$slice)]
            #[linkme(crate = $crate::linkme)]
            static ENTRY: $crate::registry::Implementation = $crate::registry::Implementation {
                point: ::core::any::TypeId::of::<$point>,
                scope: $scope,
                name: ::core::stringify!($name),
                signature: <($($ty,)+) as $crate::FromArgs>::signature,
                call: __thunk,
            };
        };
    };
}

/// Registers an invoke override for a customizer type and a target.
///
/// The target is a customization point's tag type; the override applies
/// when that point is the target, never to plain values of the tag type.
/// The handler receives the intercepted call as a
/// [`PendingCall`](crate::PendingCall).
///
/// ```ignore
/// register_override!(Fancy => ForEach, fn fancy_for_each(call) {
///     call.call_target_with(Seq)
/// });
/// ```
#[macro_export]
macro_rules! register_override {
    ($customizer:ty => $target:ty, fn $name:ident ($call:ident) $body:block) => {
        const _: () = {
            fn $name(
                $call: $crate::PendingCall,
            ) -> ::core::result::Result<$crate::Value, $crate::DispatchError> $body

            #[$crate::linkme::distributed_slice($crate::registry::INVOKE_OVERRIDES)]
            #[linkme(crate = $crate::linkme)]
            static ENTRY: $crate::registry::Override = $crate::registry::Override {
                customizer: $crate::TypeTag::of::<$customizer>,
                target: $crate::TypeTag::of::<$crate::SelfRef<$target>>,
                name: ::core::stringify!($name),
                call: $name,
            };
        };
    };
}
