//! Unit tests for task assignment and lifecycle management.
