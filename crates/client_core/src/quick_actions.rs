/// A canned prompt the presentation layer can offer as a one-click command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuickAction {
    pub label: &'static str,
    pub example: &'static str,
}

const QUICK_ACTIONS: &[QuickAction] = &[
    QuickAction {
        label: "Gmail",
        example: "send email to john",
    },
    QuickAction {
        label: "Drive",
        example: "search drive for resume",
    },
    QuickAction {
        label: "Calendar",
        example: "schedule meeting tomorrow",
    },
    QuickAction {
        label: "Meet",
        example: "start a meeting now",
    },
    QuickAction {
        label: "Tasks",
        example: "create task project report",
    },
    QuickAction {
        label: "Docs",
        example: "create a new document",
    },
];

pub fn quick_actions() -> &'static [QuickAction] {
    QUICK_ACTIONS
}

pub fn find(label: &str) -> Option<&'static QuickAction> {
    QUICK_ACTIONS
        .iter()
        .find(|action| action.label.eq_ignore_ascii_case(label.trim()))
}
