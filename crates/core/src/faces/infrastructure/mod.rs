pub mod in_memory_project_store;
