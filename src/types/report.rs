use super::wire_enum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportReason {
    Spam,
    Harassment,
    FakeProfile,
    Inappropriate,
    Other,
}

wire_enum!(ReportReason, "report reason", {
    Spam => "spam",
    Harassment => "harassment",
    FakeProfile => "fake_profile",
    Inappropriate => "inappropriate",
    Other => "other",
});
