// ==========================================
// 分配生命周期测试
// ==========================================
// 职责: 改派、开始/完成/取消、事件溯源、参数从 config_kv 加载
// ==========================================


#[cfg(test)]
mod assignment_lifecycle_test {
    use dock_door_aps::config::{config_keys, ConfigManager};
    use dock_door_aps::domain::dock_event::ReasonDetail;
    use dock_door_aps::domain::job::InboundSlotRequest;
    use dock_door_aps::domain::proposal::{Decision, Proposal};
    use dock_door_aps::domain::types::{AssignmentStatus, DockEventType, ReasonCode};
    use dock_door_aps::{ApiError, Clock, DockApi, DockRepositories};

    use crate::test_helpers::{at, base_time, create_test_db, seed_site, setup_api, LOCATION};

    fn inbound(truck_id: &str, eta_offset: i64, priority: i64) -> InboundSlotRequest {
        InboundSlotRequest {
            task_id: format!("task-{}", truck_id),
            location: LOCATION.to_string(),
            truck_id: truck_id.to_string(),
            eta_utc: at(eta_offset),
            unload_min: 30,
            priority,
            window_min: 60,
        }
    }

    fn commit_one(api: &DockApi, req: &InboundSlotRequest) -> (Proposal, Decision) {
        let proposal = api.propose_inbound(req).unwrap().unwrap();
        let decision = api.decide_and_commit(vec![proposal.clone()]).unwrap();
        assert_eq!(decision.accepted.len(), 1);
        (proposal, decision)
    }

    /// 以已提交提案为模板构造替换提案
    fn replacement(template: &Proposal, ref_id: &str, priority: i64, earliest_offset: i64) -> Proposal {
        let mut p = template.clone();
        p.proposal_id = format!("prop-{}", ref_id);
        p.task_id = format!("task-{}", ref_id);
        p.ref_id = ref_id.to_string();
        p.priority = priority;
        p.local_cost = -5 * priority;
        p.earliest_ready = at(earliest_offset);
        p
    }

    // ==========================================
    // 改派
    // ==========================================

    #[test]
    fn test_reassign_for_higher_priority() {
        let (_temp_file, api) = setup_api(1);
        let (proposal, decision) = commit_one(&api, &inbound("T-LOW", 60, 0));
        let displaced_id = decision.accepted[0].assignment_id.clone();

        let decision = api
            .reassign_and_commit(replacement(&proposal, "T-HIGH", 3, 60), &displaced_id)
            .unwrap();
        assert_eq!(decision.why, vec!["heuristic_commit", "priority_change"]);

        let schedule = api.door_schedule(LOCATION).unwrap();
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[0].ref_id, "T-HIGH");

        let history = api.job_events("T-LOW").unwrap();
        let reassigned = history
            .iter()
            .find(|e| e.event_type == DockEventType::Reassigned)
            .expect("应记录 reassigned 事件");
        match &reassigned.reason_detail {
            ReasonDetail::PriorityChange {
                previous,
                new,
                priority_delta,
            } => {
                assert_eq!(*priority_delta, 3);
                assert_eq!(previous.assignment_id, displaced_id);
                assert_eq!(new.ref_id, "T-HIGH");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_reassign_eta_slip() {
        let (_temp_file, api) = setup_api(1);
        let (proposal, decision) = commit_one(&api, &inbound("T-OLD", 60, 1));
        let displaced_id = decision.accepted[0].assignment_id.clone();

        let decision = api
            .reassign_and_commit(replacement(&proposal, "T-NEW", 1, 45), &displaced_id)
            .unwrap();
        assert_eq!(decision.why, vec!["heuristic_commit", "eta_slip"]);

        let events = api.job_events("T-OLD").unwrap();
        let detail = &events.last().unwrap().reason_detail;
        match detail {
            ReasonDetail::EtaSlip { eta_delta_minutes, .. } => assert_eq!(*eta_delta_minutes, -15),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_reassign_operational_conflict() {
        let (_temp_file, api) = setup_api(1);
        let (proposal, decision) = commit_one(&api, &inbound("T-A", 60, 1));
        commit_one(&api, &inbound("T-B", 90, 1));
        let displaced_id = decision.accepted[0].assignment_id.clone();

        let decision = api
            .reassign_and_commit(replacement(&proposal, "T-C", 1, 60), &displaced_id)
            .unwrap();
        assert_eq!(decision.why, vec!["heuristic_commit", "operational_conflict"]);

        let reassigned = api
            .job_events("T-A")
            .unwrap()
            .into_iter()
            .find(|e| e.reason_code() == ReasonCode::OperationalConflict)
            .unwrap();
        match reassigned.reason_detail {
            ReasonDetail::OperationalConflict {
                competing_assignment_count,
                ..
            } => assert_eq!(competing_assignment_count, 1),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_reassign_requires_scheduled_assignment() {
        let (_temp_file, api) = setup_api(1);
        let (proposal, decision) = commit_one(&api, &inbound("T-OLD", 0, 0));
        let displaced_id = decision.accepted[0].assignment_id.clone();
        api.start_assignment(&displaced_id).unwrap();

        let err = api
            .reassign_and_commit(replacement(&proposal, "T-NEW", 5, 0), &displaced_id)
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidStateTransition { .. }));

        let err = api
            .reassign_and_commit(replacement(&proposal, "T-NEW", 5, 0), "asg-missing")
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    // ==========================================
    // 执行跟踪
    // ==========================================

    #[test]
    fn test_start_then_complete() {
        let (_temp_file, api) = setup_api(1);
        let (_, decision) = commit_one(&api, &inbound("T-001", 0, 0));
        let id = decision.accepted[0].assignment_id.clone();

        let started = api.start_assignment(&id).unwrap();
        assert_eq!(started.status, AssignmentStatus::InProgress);

        let done = api.complete_assignment(&id).unwrap();
        assert_eq!(done.status, AssignmentStatus::Completed);
        assert!(api.door_schedule(LOCATION).unwrap().is_empty());

        let events = api.door_events("FRE-D01", None).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, DockEventType::Completed);
        match &events[0].reason_detail {
            ReasonDetail::NormalCompletion { duration_minutes, .. } => {
                assert_eq!(*duration_minutes, 30)
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_cancel_frees_the_door() {
        let (_temp_file, api) = setup_api(1);
        let (_, decision) = commit_one(&api, &inbound("T-001", 0, 0));
        let id = decision.accepted[0].assignment_id.clone();

        let cancelled = api
            .cancel_assignment(&id, Some("司机爽约".to_string()))
            .unwrap();
        assert_eq!(cancelled.status, AssignmentStatus::Cancelled);

        let next = api.propose_inbound(&inbound("T-002", 0, 0)).unwrap().unwrap();
        assert_eq!(next.start, at(0));

        let events = api.job_events("T-001").unwrap();
        match &events.last().unwrap().reason_detail {
            ReasonDetail::Cancelled { note, .. } => assert_eq!(note.as_deref(), Some("司机爽约")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_invalid_transitions() {
        let (_temp_file, api) = setup_api(1);
        let (_, decision) = commit_one(&api, &inbound("T-001", 0, 0));
        let id = decision.accepted[0].assignment_id.clone();

        let err = api.complete_assignment(&id).unwrap_err();
        assert!(matches!(err, ApiError::InvalidStateTransition { .. }));

        api.cancel_assignment(&id, None).unwrap();
        let err = api.start_assignment(&id).unwrap_err();
        assert!(matches!(err, ApiError::InvalidStateTransition { .. }));

        let err = api.cancel_assignment("asg-missing", None).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        // 失败的流转不追加事件
        assert_eq!(api.job_events("T-001").unwrap().len(), 2);
    }

    // ==========================================
    // 参数加载
    // ==========================================

    #[test]
    fn test_threshold_override_from_config_table() {
        let (_temp_file, conn) = create_test_db().unwrap();
        seed_site(&DockRepositories::from_connection(conn.clone()), LOCATION, 1, 240).unwrap();

        ConfigManager::from_connection(conn.clone())
            .set_global_config_value(config_keys::ACCEPTANCE_THRESHOLD, "0.85")
            .unwrap();

        let api = DockApi::from_connection(conn)
            .unwrap()
            .with_clock(Clock::Fixed(base_time()));
        assert_eq!(api.config().acceptance_threshold, 0.85);

        // 等待 20 分钟、成本 20 → 置信度 0.9
        let blocker = api.propose_inbound(&inbound("T-001", 0, 0)).unwrap().unwrap();
        api.decide_and_commit(vec![blocker]).unwrap();

        let mut req = inbound("T-002", 10, 0);
        req.unload_min = 20;
        let waiting = api.propose_inbound(&req).unwrap().unwrap();
        assert_eq!(waiting.wait_min, 20);
        let decision = api.decide_and_commit(vec![waiting]).unwrap();
        assert_eq!(decision.accepted.len(), 1);

        // 等待 40 分钟 → 置信度 0.8，低于阈值
        let mut req = inbound("T-003", 10, 0);
        req.unload_min = 20;
        let late = api.propose_inbound(&req).unwrap().unwrap();
        assert_eq!(late.wait_min, 40);
        let decision = api.decide_and_commit(vec![late]).unwrap();
        assert!(decision.accepted.is_empty());
        assert_eq!(decision.rejections[0].reason.code(), "low_confidence");
    }
}
