use crate::basic_types::sequence_generators::ConstantSequence;
use crate::basic_types::sequence_generators::GeometricSequence;
use crate::basic_types::sequence_generators::LubySequence;
use crate::basic_types::sequence_generators::SequenceGenerator;
use crate::basic_types::sequence_generators::SequenceGeneratorType;

/// Options controlling the restart schedule.
#[derive(Debug, Clone, Copy)]
pub struct RestartOptions {
    /// The sequence that generates the number of conflicts allowed before each restart.
    pub sequence_generator_type: SequenceGeneratorType,
    /// Multiplier applied to the sequence; with the Luby sequence and a base interval of 100
    /// the conflict budgets are 100, 100, 200, 100, ...
    pub base_interval: u64,
    /// The coefficient of the geometric sequence, used only with
    /// [`SequenceGeneratorType::Geometric`].
    pub geometric_coefficient: f64,
}

impl Default for RestartOptions {
    fn default() -> Self {
        RestartOptions {
            sequence_generator_type: SequenceGeneratorType::Luby,
            base_interval: 100,
            geometric_coefficient: 2.0,
        }
    }
}

/// Produces the per-restart conflict budgets and tracks how many restarts took place. A
/// restart cancels the search to the root level without touching the learnt clause database.
#[derive(Debug)]
pub struct RestartStrategy {
    sequence_generator: Box<dyn SequenceGenerator>,
    num_restarts: u64,
}

impl Default for RestartStrategy {
    fn default() -> Self {
        RestartStrategy::new(RestartOptions::default())
    }
}

impl RestartStrategy {
    pub fn new(options: RestartOptions) -> RestartStrategy {
        let sequence_generator: Box<dyn SequenceGenerator> =
            match options.sequence_generator_type {
                SequenceGeneratorType::Constant => {
                    Box::new(ConstantSequence::new(options.base_interval as i64))
                }
                SequenceGeneratorType::Geometric => Box::new(GeometricSequence::new(
                    options.base_interval as i64,
                    options.geometric_coefficient,
                )),
                SequenceGeneratorType::Luby => {
                    Box::new(LubySequence::new(options.base_interval as i64))
                }
            };

        RestartStrategy {
            sequence_generator,
            num_restarts: 0,
        }
    }

    /// The number of conflicts allowed before the next restart.
    pub fn next_conflict_budget(&mut self) -> i64 {
        self.sequence_generator.next()
    }

    pub fn notify_restart(&mut self) {
        self.num_restarts += 1;
    }

    pub fn num_restarts(&self) -> u64 {
        self.num_restarts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luby_budgets_follow_the_scaled_sequence() {
        let mut strategy = RestartStrategy::new(RestartOptions {
            sequence_generator_type: SequenceGeneratorType::Luby,
            base_interval: 100,
            geometric_coefficient: 2.0,
        });

        let budgets: Vec<i64> = (0..7).map(|_| strategy.next_conflict_budget()).collect();
        assert_eq!(budgets, vec![100, 100, 200, 100, 100, 200, 400]);
    }

    #[test]
    fn geometric_budgets_double() {
        let mut strategy = RestartStrategy::new(RestartOptions {
            sequence_generator_type: SequenceGeneratorType::Geometric,
            base_interval: 100,
            geometric_coefficient: 2.0,
        });

        let budgets: Vec<i64> = (0..4).map(|_| strategy.next_conflict_budget()).collect();
        assert_eq!(budgets, vec![100, 200, 400, 800]);
    }
}
