use crate::session::Role;
use crate::types::Position;

/// What a consumed click turns into, fixed from the role at arm time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlacementKind {
    CreateBin,
    RequestBin,
}

impl PlacementKind {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Admin => Self::CreateBin,
            Role::User => Self::RequestBin,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InteractionMode {
    #[default]
    Idle,
    Armed { role: Role, kind: PlacementKind },
}

impl InteractionMode {
    pub fn is_armed(&self) -> bool {
        matches!(self, Self::Armed { .. })
    }
}

/// Emitted exactly once per click consumed while armed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlacementCommand {
    OpenCreateForm(Position),
    OpenRequestForm(Position),
}

impl PlacementCommand {
    pub fn position(&self) -> Position {
        match self {
            Self::OpenCreateForm(position) | Self::OpenRequestForm(position) => *position,
        }
    }
}

/// Turns an arm toggle plus one map click into at most one placement command
#[derive(Debug, Default)]
pub struct InteractionModeController {
    mode: InteractionMode,
}

impl InteractionModeController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> InteractionMode {
        self.mode
    }

    /// Arms for the given role, or disarms if already armed
    pub fn arm(&mut self, role: Role) -> InteractionMode {
        self.mode = match self.mode {
            InteractionMode::Idle => InteractionMode::Armed {
                role,
                kind: PlacementKind::for_role(role),
            },
            InteractionMode::Armed { .. } => InteractionMode::Idle,
        };
        tracing::debug!("Interaction mode is now {:?}", self.mode);
        self.mode
    }

    /// Consumes the click if armed. Disarms before returning the command.
    pub fn handle_click(&mut self, position: Position) -> Option<PlacementCommand> {
        let InteractionMode::Armed { kind, .. } = std::mem::take(&mut self.mode) else {
            return None;
        };

        let command = match kind {
            PlacementKind::CreateBin => PlacementCommand::OpenCreateForm(position),
            PlacementKind::RequestBin => PlacementCommand::OpenRequestForm(position),
        };
        tracing::debug!("Map click consumed as {:?}", command);
        Some(command)
    }

    pub fn reset(&mut self) {
        self.mode = InteractionMode::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy)]
    enum Step {
        Arm,
        Click,
    }

    #[test]
    fn test_admin_click_opens_create_form() {
        let mut controller = InteractionModeController::new();
        assert_eq!(
            controller.arm(Role::Admin),
            InteractionMode::Armed {
                role: Role::Admin,
                kind: PlacementKind::CreateBin
            }
        );

        let command = controller.handle_click(Position::new(12.30, 45.60));
        assert_eq!(
            command,
            Some(PlacementCommand::OpenCreateForm(Position::new(12.30, 45.60)))
        );
        assert_eq!(controller.mode(), InteractionMode::Idle);
    }

    #[test]
    fn test_user_click_opens_request_form() {
        let mut controller = InteractionModeController::new();
        controller.arm(Role::User);
        assert_eq!(
            controller.handle_click(Position::new(12.30, 45.60)),
            Some(PlacementCommand::OpenRequestForm(Position::new(12.30, 45.60)))
        );
        assert!(!controller.mode().is_armed());
    }

    #[test]
    fn test_idle_click_is_ignored() {
        let mut controller = InteractionModeController::new();
        assert_eq!(controller.handle_click(Position::new(1.0, 2.0)), None);
        assert_eq!(controller.mode(), InteractionMode::Idle);
    }

    #[test]
    fn test_double_arm_cancels() {
        let mut controller = InteractionModeController::new();
        controller.arm(Role::Admin);
        assert_eq!(controller.arm(Role::Admin), InteractionMode::Idle);
        assert_eq!(controller.handle_click(Position::new(1.0, 2.0)), None);
    }

    #[test]
    fn test_second_click_is_not_consumed() {
        let mut controller = InteractionModeController::new();
        controller.arm(Role::User);
        assert!(controller.handle_click(Position::new(1.0, 2.0)).is_some());
        assert!(controller.handle_click(Position::new(3.0, 4.0)).is_none());
    }

    #[test]
    fn test_commands_match_armed_clicks_for_every_sequence() {
        // Every arm/click sequence up to length 8, for both roles
        for role in [Role::Admin, Role::User] {
            for len in 0..=8u32 {
                for bits in 0..(1u32 << len) {
                    let steps: Vec<Step> = (0..len)
                        .map(|i| if bits & (1 << i) == 0 { Step::Arm } else { Step::Click })
                        .collect();

                    let mut controller = InteractionModeController::new();
                    let mut armed_clicks = 0;
                    let mut commands = 0;
                    for (i, step) in steps.iter().enumerate() {
                        match step {
                            Step::Arm => {
                                controller.arm(role);
                            }
                            Step::Click => {
                                let was_armed = controller.mode().is_armed();
                                let command =
                                    controller.handle_click(Position::new(i as f64, 0.0));
                                if was_armed {
                                    armed_clicks += 1;
                                    let command = command.expect("armed click must emit");
                                    assert_eq!(command.position(), Position::new(i as f64, 0.0));
                                    assert_eq!(
                                        matches!(command, PlacementCommand::OpenCreateForm(_)),
                                        role == Role::Admin
                                    );
                                    commands += 1;
                                    assert_eq!(controller.mode(), InteractionMode::Idle);
                                } else {
                                    assert!(command.is_none(), "steps: {steps:?}");
                                }
                            }
                        }
                    }
                    assert_eq!(commands, armed_clicks, "steps: {steps:?}");
                }
            }
        }
    }

    #[test]
    fn test_kind_is_fixed_at_arm_time() {
        let mut controller = InteractionModeController::new();
        controller.arm(Role::User);
        // Arming again with another role only disarms; it never upgrades the kind
        assert_eq!(controller.arm(Role::Admin), InteractionMode::Idle);
        controller.arm(Role::User);
        assert!(matches!(
            controller.handle_click(Position::new(0.0, 0.0)),
            Some(PlacementCommand::OpenRequestForm(_))
        ));
    }
}
