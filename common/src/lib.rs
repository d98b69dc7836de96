// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

//! Types shared by the server and its clients: the persisted entities, their
//! creation payloads and patches, request validation, and the derived views
//! computed from task lists.
pub mod schema;
pub mod validation;
pub mod views;

pub use schema::{
    Board, BoardPatch, BoardWithTasks, InsertBoard, InsertTask, InsertTimeEntry, InsertUser,
    Task, TaskPatch, TaskPositions, TaskPriority, TaskStatus, TaskWithAssignee, TimeEntry, User,
};
pub use validation::{FieldError, Validate};
