// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace-level integration specs: the assembled HTTP surface driven
//! over a real socket, plus direct service calls where the clock matters.

#[path = "specs/support.rs"]
mod support;

#[path = "specs/dispatch.rs"]
mod dispatch;
#[path = "specs/lifecycle.rs"]
mod lifecycle;
#[path = "specs/logs.rs"]
mod logs;
#[path = "specs/scheduler.rs"]
mod scheduler;
#[path = "specs/skills.rs"]
mod skills;
#[path = "specs/tenancy.rs"]
mod tenancy;
