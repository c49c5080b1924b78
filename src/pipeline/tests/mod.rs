//! Pipeline tests, organized by the submodule they exercise.
