// ==========================================
// DockApi 单作业提案与提交测试
// ==========================================
// 职责: 验证 propose_inbound / propose_outbound / decide_and_commit 端到端行为
// ==========================================


#[cfg(test)]
mod dock_api_test {
    use dock_door_aps::domain::job::{InboundSlotRequest, OutboundSlotRequest};
    use chrono::Duration;
    use dock_door_aps::domain::types::{AllocationStrategy, ReasonCode};
    use dock_door_aps::ApiError;

    use crate::test_helpers::{at, job, setup_api, LOCATION};

    fn inbound(truck_id: &str, eta_offset: i64, unload_min: i64, window_min: i64) -> InboundSlotRequest {
        InboundSlotRequest {
            task_id: format!("task-{}", truck_id),
            location: LOCATION.to_string(),
            truck_id: truck_id.to_string(),
            eta_utc: at(eta_offset),
            unload_min,
            priority: 0,
            window_min,
        }
    }

    // ==========================================
    // 场景A: 空站点，首门、零成本
    // ==========================================

    #[test]
    fn test_empty_site_inbound_is_committed() {
        let (_temp_file, api) = setup_api(3);

        let proposal = api
            .propose_inbound(&inbound("T-001", 0, 30, 60))
            .unwrap()
            .expect("空站点应有可行门位");
        assert_eq!(proposal.door_id, "FRE-D01");
        assert_eq!(proposal.start, at(0));
        assert_eq!(proposal.end, at(30));
        assert_eq!(proposal.local_cost, 0);
        assert_eq!(proposal.strategy, AllocationStrategy::Heuristic);

        let decision = api.decide_and_commit(vec![proposal]).unwrap();
        assert_eq!(decision.accepted.len(), 1);
        assert_eq!(decision.confidence, 1.0);
        assert_eq!(decision.why, vec!["heuristic_commit"]);

        let events = api.door_events("FRE-D01", None).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].reason_code(), ReasonCode::HeuristicChoice);
        assert_eq!(events[0].ref_id.as_deref(), Some("T-001"));

        let schedule = api.door_schedule(LOCATION).unwrap();
        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule[0].assignment_id, decision.accepted[0].assignment_id);
    }

    // ==========================================
    // 第一扇门被占用
    // ==========================================

    #[test]
    fn test_busy_first_door_moves_to_second() {
        let (_temp_file, api) = setup_api(2);

        let first = api
            .propose_inbound(&inbound("T-001", 0, 60, 60))
            .unwrap()
            .unwrap();
        api.decide_and_commit(vec![first]).unwrap();

        let second = api
            .propose_inbound(&inbound("T-002", 0, 30, 60))
            .unwrap()
            .unwrap();
        assert_eq!(second.door_id, "FRE-D02");
        assert_eq!(second.start, at(0));
    }

    // ==========================================
    // 唯一门忙到超出最大等待
    // ==========================================

    #[test]
    fn test_no_feasible_door_returns_none() {
        let (_temp_file, api) = setup_api(1);

        let blocker = api
            .propose_inbound(&inbound("T-001", 0, 120, 60))
            .unwrap()
            .unwrap();
        let decision = api.decide_and_commit(vec![blocker]).unwrap();
        assert_eq!(decision.accepted.len(), 1);

        let result = api.propose_inbound(&inbound("T-002", 0, 30, 60)).unwrap();
        assert!(result.is_none());
    }

    // 场景B: 单门已有 [T0, T0+30)，新作业 T0+10 就绪 → T0+30 开始，等待 20
    #[test]
    fn test_waits_behind_existing_assignment() {
        let (_temp_file, api) = setup_api(1);

        let blocker = api
            .propose_inbound(&inbound("T-001", 0, 30, 60))
            .unwrap()
            .unwrap();
        api.decide_and_commit(vec![blocker]).unwrap();

        let next = api
            .propose_inbound(&inbound("T-002", 10, 20, 60))
            .unwrap()
            .unwrap();
        assert_eq!(next.start, at(30));
        assert_eq!(next.end, at(50));
        assert_eq!(next.wait_min, 20);
    }

    #[test]
    fn test_outbound_lateness_lowers_confidence() {
        let (_temp_file, api) = setup_api(1);

        let req = OutboundSlotRequest {
            task_id: "task-L-001".to_string(),
            location: LOCATION.to_string(),
            load_id: "L-001".to_string(),
            cutoff_utc: at(20),
            load_min: 30,
            priority: 0,
            window_min: 60,
        };
        let proposal = api.propose_outbound(&req).unwrap().unwrap();
        assert_eq!(proposal.earliest_ready, at(0));
        assert_eq!(proposal.lateness_min, 10);
        assert_eq!(proposal.local_cost, 20);

        let decision = api.decide_and_commit(vec![proposal]).unwrap();
        assert_eq!(decision.accepted.len(), 1);
        assert!((decision.confidence - 0.85).abs() < 1e-9);
    }

    #[test]
    fn test_stale_proposals_are_rejected_as_double_booking() {
        let (_temp_file, api) = setup_api(2);

        // 两个提案基于同一快照，都选中 D01 08:00
        let a = api.propose_inbound(&inbound("T-001", 0, 30, 60)).unwrap().unwrap();
        let b = api.propose_inbound(&inbound("T-002", 0, 30, 60)).unwrap().unwrap();
        assert_eq!(a.door_id, b.door_id);

        let decision = api.decide_and_commit(vec![a, b]).unwrap();
        assert_eq!(decision.accepted.len(), 1);
        assert_eq!(decision.rejections.len(), 1);
        assert_eq!(decision.rejections[0].ref_id, "T-002");
        assert_eq!(decision.rejections[0].reason.code(), "double_booking");
        assert_eq!(decision.confidence, 1.0);
        assert_eq!(api.door_schedule(LOCATION).unwrap().len(), 1);
    }

    #[test]
    fn test_mixed_strategies_carry_both_tags() {
        let (_temp_file, api) = setup_api(2);

        let a = api.propose_inbound(&inbound("T-001", 0, 30, 60)).unwrap().unwrap();
        let mut b = api.propose_inbound(&inbound("T-002", 60, 30, 60)).unwrap().unwrap();
        b.strategy = AllocationStrategy::Solver;

        let decision = api.decide_and_commit(vec![a, b]).unwrap();
        assert_eq!(decision.why, vec!["heuristic_commit", "solver_commit"]);
    }

    #[test]
    fn test_empty_commit() {
        let (_temp_file, api) = setup_api(1);
        let decision = api.decide_and_commit(Vec::new()).unwrap();
        assert!(decision.accepted.is_empty());
        assert_eq!(decision.confidence, 0.0);
        assert_eq!(decision.why, vec!["heuristic_commit"]);
    }

    #[test]
    fn test_invalid_request_is_rejected() {
        let (_temp_file, api) = setup_api(1);
        let err = api.propose_inbound(&inbound("T-001", 0, 0, 60)).unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[test]
    fn test_unknown_location_has_no_proposal() {
        let (_temp_file, api) = setup_api(1);
        let mut req = inbound("T-001", 0, 30, 60);
        req.location = "AUS".to_string();
        assert!(api.propose_inbound(&req).unwrap().is_none());
    }

    #[test]
    fn test_out_of_range_requests_are_rejected_without_panic() {
        let (_temp_file, api) = setup_api(1);

        let huge_unload = inbound("T-001", 0, i64::MAX / 2, 60);
        let err = api.propose_inbound(&huge_unload).unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        let mut huge_priority = inbound("T-002", 0, 30, 60);
        huge_priority.priority = i64::MAX;
        let err = api.propose_inbound(&huge_priority).unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        let req = OutboundSlotRequest {
            task_id: "task-L-001".to_string(),
            location: LOCATION.to_string(),
            load_id: "L-001".to_string(),
            cutoff_utc: at(60),
            load_min: i64::MAX,
            priority: 0,
            window_min: 60,
        };
        assert!(matches!(api.propose_outbound(&req), Err(ApiError::InvalidInput(_))));

        let mut batch_job = job("J1", 0, 30, 0);
        batch_job.priority = i64::MIN;
        let err = api.optimize_batch_and_commit(&[batch_job], LOCATION).unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
        assert!(api.door_schedule(LOCATION).unwrap().is_empty());
    }

    #[test]
    fn test_sub_second_eta_never_starts_before_ready() {
        let (_temp_file, api) = setup_api(1);

        let mut req = inbound("T-001", 0, 30, 60);
        req.eta_utc = at(0) + Duration::milliseconds(500);
        let proposal = api.propose_inbound(&req).unwrap().unwrap();
        assert_eq!(proposal.earliest_ready, at(0));
        assert_eq!(proposal.start, at(0));

        api.decide_and_commit(vec![proposal]).unwrap();
        let schedule = api.door_schedule(LOCATION).unwrap();
        assert_eq!(schedule[0].start, at(0));
        assert!(schedule[0].start >= schedule[0].rationale.earliest_ready);

        let mut batch_job = job("J2", 30, 30, 1);
        batch_job.earliest_ready = at(30) + Duration::milliseconds(250);
        let decision = api.optimize_batch_and_commit(&[batch_job], LOCATION).unwrap();
        assert_eq!(decision.accepted[0].proposal.start, at(30));
        assert_eq!(decision.accepted[0].proposal.earliest_ready, at(30));
    }
}
