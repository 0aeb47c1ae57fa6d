//! Mental preparation templates

use super::distances::DistanceCategory;
use super::{Classification, GoalType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindsetPlan {
    pub focus: String,
    pub mantras: Vec<String>,
    pub strategies: Vec<String>,
    /// What to do when things go wrong
    pub contingencies: Vec<String>,
    /// Only filled for professional athletes
    pub professional_tactics: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MindsetPlanner;

impl MindsetPlanner {
    pub fn new() -> Self {
        MindsetPlanner
    }

    pub fn plan(
        &self,
        goal: GoalType,
        classification: Classification,
        category: DistanceCategory,
    ) -> MindsetPlan {
        let (focus, mantras, mut strategies) = match goal {
            GoalType::Finish => (
                "Enjoy the day and finish strong",
                vec!["Relentless forward motion", "One aid station at a time"],
                vec![
                    "Start conservatively and stay below your targets in the first hour",
                    "Break the race into small segments and celebrate each one",
                ],
            ),
            GoalType::PersonalBest => (
                "Execute the pacing plan to the second",
                vec!["Smooth is fast", "Trust the numbers"],
                vec![
                    "Hold the middle of your target ranges and negative split the run",
                    "Check power or pace every few minutes rather than chasing others",
                ],
            ),
            GoalType::Podium => (
                "Race your age group, not the clock",
                vec!["Hunt, don't hope", "Hurt is temporary"],
                vec![
                    "Know your rivals and where you can gain time on them",
                    "Save one decisive effort for the second half of the run",
                ],
            ),
            GoalType::Qualification => (
                "Secure the slot with disciplined execution",
                vec!["Every second counts", "Stay in the process"],
                vec![
                    "Know the qualifying time and your split targets for it",
                    "Avoid penalties: know the drafting and transition rules",
                ],
            ),
        };
        if category.is_long_course() {
            strategies.push("Expect low patches and plan to eat and drink through them");
        }

        let contingencies = vec![
            "Mechanical: stay calm, fix it methodically, then resume target effort",
            "Stomach problems: switch to water and simple carbohydrate until settled",
            "Bad swim: reset in T1; the race is decided on the bike and run",
        ];

        let professional_tactics = match classification {
            Classification::Professional => vec![
                "Position in the front pack on the swim to avoid gaps",
                "Cover moves on the bike only when they threaten the race outcome",
                "Know time gaps to rivals from course support at every split",
            ],
            Classification::AgeGroup => Vec::new(),
        };

        let owned = |items: Vec<&str>| items.into_iter().map(String::from).collect::<Vec<_>>();
        MindsetPlan {
            focus: focus.to_string(),
            mantras: owned(mantras),
            strategies: owned(strategies),
            contingencies: owned(contingencies),
            professional_tactics: owned(professional_tactics),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_professional_tactics_only_for_professionals() {
        let planner = MindsetPlanner::new();
        let olympic = DistanceCategory::Olympic;
        let pro = planner.plan(GoalType::Podium, Classification::Professional, olympic);
        let age_group = planner.plan(GoalType::Podium, Classification::AgeGroup, olympic);

        assert!(!pro.professional_tactics.is_empty());
        assert!(age_group.professional_tactics.is_empty());
        assert_eq!(pro.focus, age_group.focus);
    }

    #[test]
    fn test_goal_selects_template() {
        let planner = MindsetPlanner::new();
        let sprint = DistanceCategory::Sprint;
        let finish = planner.plan(GoalType::Finish, Classification::AgeGroup, sprint);
        let qualify = planner.plan(GoalType::Qualification, Classification::AgeGroup, sprint);
        assert_ne!(finish.focus, qualify.focus);

        let long = planner.plan(GoalType::Finish, Classification::AgeGroup, DistanceCategory::Full);
        assert_eq!(long.strategies.len(), finish.strategies.len() + 1);
    }
}
