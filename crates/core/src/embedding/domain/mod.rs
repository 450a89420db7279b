pub mod dimension_reducer;
