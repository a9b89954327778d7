use super::wire_enum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwipeDirection {
    Like,
    Pass,
}

wire_enum!(SwipeDirection, "swipe direction", {
    Like => "like",
    Pass => "pass",
});
