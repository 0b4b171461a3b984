#![macro_use]

/// Builds a [`GrfTable`](crate::grf::GrfTable) in const context.
///
/// Signals left out of the list stay [`GrfDesc::ABSENT`](crate::grf::GrfDesc::ABSENT).
///
/// ```ignore
/// const TABLE: GrfTable = grf_table! {
///     DpiUpdateCfg => (0x3a8, 0, 0),
///     TurnRequest => (0x3a4, 10, 8),
/// };
/// ```
macro_rules! grf_table {
    ($($signal:ident => ($reg:expr, $high:expr, $low:expr)),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut table = [crate::grf::GrfDesc::ABSENT; crate::grf::GrfSignal::COUNT];
        $(
            table[crate::grf::GrfSignal::$signal as usize] =
                crate::grf::GrfDesc::new($reg, $high, $low);
        )*
        table
    }};
}
