pub mod cpu_pair_evaluator;
pub mod evaluator_factory;
pub mod gpu_context;
pub mod gpu_pair_evaluator;
