// ==========================================
// 装卸月台门分配系统 - 决策提交
// ==========================================
// 职责: 逐个提案 校验 → 评分 → 落库（分配 + 事件同事务）
// 红线: 整批校验与落库在站点锁内完成，校验基于锁内读取的最新快照
// 红线: 校验失败不中断批次，只记录拒绝并累加惩罚
// ==========================================

mod builders;

#[cfg(test)]
mod tests;

use crate::config::AllocatorConfig;
use crate::domain::dock_event::{DockEvent, ReassignmentParty};
use crate::domain::proposal::{AcceptedProposal, Decision, Proposal, Rejection, RejectionReason};
use crate::domain::types::{new_id, AssignmentStatus, DockEventType};
use crate::engine::confidence::ConfidenceScorer;
use crate::engine::location_lock::LocationLocks;
use crate::engine::reassignment::ReassignmentClassifier;
use crate::engine::repositories::DockRepositories;
use crate::engine::validator::{ConstraintValidator, ValidationSnapshot};
use crate::repository::error::{RepositoryError, RepositoryResult};
use builders::{build_assignment, build_assigned_event};
use chrono::NaiveDateTime;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// 单个提案的判定结果（纯计算，不含存储）
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Accepted { confidence: f64 },
    Rejected { reason: RejectionReason, confidence: f64 },
}

enum CommitStep {
    Accepted { assignment_id: String, confidence: f64 },
    Rejected { reason: RejectionReason, confidence: f64 },
}

// ==========================================
// DecisionCommitter - 决策提交器
// ==========================================
pub struct DecisionCommitter {
    repos: DockRepositories,
    validator: ConstraintValidator,
    scorer: ConfidenceScorer,
    classifier: ReassignmentClassifier,
    locks: Arc<LocationLocks>,
    rejection_penalty: f64,
    competing_window_min: i64,
}

impl DecisionCommitter {
    pub fn new(repos: DockRepositories, config: &AllocatorConfig, locks: Arc<LocationLocks>) -> Self {
        Self {
            repos,
            validator: ConstraintValidator::new(config.min_crews, config.min_forklifts),
            scorer: ConfidenceScorer::new(config.acceptance_threshold),
            classifier: ReassignmentClassifier::new(),
            locks,
            rejection_penalty: config.rejection_penalty,
            competing_window_min: config.competing_window_min,
        }
    }

    /// 纯判定: 校验 + 评分
    pub fn evaluate(
        &self,
        proposal: &Proposal,
        snapshot: &ValidationSnapshot,
        accumulated_penalty: f64,
    ) -> Evaluation {
        match self.validator.validate(proposal, snapshot) {
            Err(failure) => {
                let score = self.scorer.score(proposal, false, accumulated_penalty);
                Evaluation::Rejected {
                    reason: RejectionReason::Validation { failure },
                    confidence: score.confidence,
                }
            }
            Ok(()) => {
                let score = self.scorer.score(proposal, true, accumulated_penalty);
                if score.accepted {
                    Evaluation::Accepted {
                        confidence: score.confidence,
                    }
                } else {
                    Evaluation::Rejected {
                        reason: RejectionReason::LowConfidence {
                            confidence: score.confidence,
                            threshold: self.scorer.threshold(),
                        },
                        confidence: score.confidence,
                    }
                }
            }
        }
    }

    /// 读取校验快照（门 + 门上占用 + 日历）
    pub fn load_snapshot(&self, proposal: &Proposal) -> RepositoryResult<ValidationSnapshot> {
        let window = proposal.window();
        Ok(ValidationSnapshot {
            door: self.repos.door_repo.find_by_id(&proposal.door_id)?,
            door_spans: self
                .repos
                .assignment_repo
                .find_active_on_door(&proposal.door_id, &window)?,
            calendar: self
                .repos
                .calendar_repo
                .find_in_range(&proposal.location, &window)?,
        })
    }

    /// 按输入顺序逐个提交，整个序列持有所涉站点的锁
    ///
    /// # 返回
    /// - Ok(Decision): 接受/拒绝明细，置信度为已接受提案的平均值
    /// - Err: 仅存储失败
    #[instrument(skip(self, proposals, why), fields(count = proposals.len()))]
    pub fn commit_batch(
        &self,
        proposals: Vec<Proposal>,
        decision_id: String,
        why: Vec<String>,
        now: NaiveDateTime,
    ) -> RepositoryResult<Decision> {
        let locations: Vec<String> = proposals.iter().map(|p| p.location.clone()).collect();
        self.locks
            .run_locked_all(locations.iter().map(String::as_str), || {
                self.commit_sequence(proposals, decision_id, why, now)
            })
    }

    /// 锁内: 按输入顺序逐个判定与落库，拒绝累加惩罚
    fn commit_sequence(
        &self,
        proposals: Vec<Proposal>,
        decision_id: String,
        why: Vec<String>,
        now: NaiveDateTime,
    ) -> RepositoryResult<Decision> {
        let mut accepted: Vec<AcceptedProposal> = Vec::new();
        let mut rejections: Vec<Rejection> = Vec::new();
        let mut penalty = 0.0;

        for proposal in proposals {
            let step = self.commit_one(&proposal, penalty, now)?;

            match step {
                CommitStep::Accepted {
                    assignment_id,
                    confidence,
                } => {
                    info!(
                        proposal_id = %proposal.proposal_id,
                        door_id = %proposal.door_id,
                        assignment_id = %assignment_id,
                        confidence,
                        "提案已接受"
                    );
                    accepted.push(AcceptedProposal {
                        proposal,
                        assignment_id,
                        confidence,
                    });
                }
                CommitStep::Rejected { reason, confidence } => {
                    warn!(
                        proposal_id = %proposal.proposal_id,
                        door_id = %proposal.door_id,
                        reason = reason.code(),
                        confidence,
                        "提案被拒绝"
                    );
                    penalty += self.rejection_penalty;
                    rejections.push(Rejection {
                        proposal_id: proposal.proposal_id,
                        ref_id: proposal.ref_id,
                        door_id: proposal.door_id,
                        reason,
                        confidence,
                    });
                }
            }
        }

        Ok(Decision {
            decision_id,
            confidence: Decision::mean_confidence(&accepted),
            accepted,
            why,
            rejections,
            unassigned: Vec::new(),
        })
    }

    /// 读快照 → 判定 → 落库
    fn commit_one(
        &self,
        proposal: &Proposal,
        penalty: f64,
        now: NaiveDateTime,
    ) -> RepositoryResult<CommitStep> {
        let snapshot = self.load_snapshot(proposal)?;
        match self.evaluate(proposal, &snapshot, penalty) {
            Evaluation::Accepted { confidence } => {
                let assignment = build_assignment(proposal, confidence, now);
                let event = build_assigned_event(&assignment, confidence, now);
                self.repos.assignment_repo.insert_with_event(&assignment, &event)?;
                Ok(CommitStep::Accepted {
                    assignment_id: assignment.assignment_id,
                    confidence,
                })
            }
            Evaluation::Rejected { reason, confidence } => Ok(CommitStep::Rejected { reason, confidence }),
        }
    }

    /// 改派提交
    ///
    /// 被替换的分配必须为 scheduled、位于同一门且与新提案时间重叠。
    /// 新提案在排除被替换分配后的快照上校验；拒绝时不改动任何状态。
    ///
    /// # 返回
    /// - Err(NotFound / InvalidStateTransition / BusinessRuleViolation): 被替换分配不满足前提
    #[instrument(skip(self, proposal), fields(proposal_id = %proposal.proposal_id))]
    pub fn commit_reassignment(
        &self,
        proposal: Proposal,
        displaced_id: &str,
        decision_id: String,
        now: NaiveDateTime,
    ) -> RepositoryResult<Decision> {
        let location = proposal.location.clone();
        self.locks.run_locked(&location, || {
            let displaced = self
                .repos
                .assignment_repo
                .find_by_id(displaced_id)?
                .ok_or_else(|| RepositoryError::NotFound {
                    entity: "Assignment".to_string(),
                    id: displaced_id.to_string(),
                })?;

            if displaced.status != AssignmentStatus::Scheduled {
                return Err(RepositoryError::InvalidStateTransition {
                    from: displaced.status.to_string(),
                    to: AssignmentStatus::Reassigned.to_string(),
                });
            }
            if displaced.door_id != proposal.door_id || !displaced.window().overlaps(&proposal.window()) {
                return Err(RepositoryError::BusinessRuleViolation(format!(
                    "分配 {} 与提案 {} 不在同一门的重叠时段",
                    displaced_id, proposal.proposal_id
                )));
            }

            let snapshot = self.load_snapshot(&proposal)?.without_assignment(displaced_id);
            let why_tag = proposal.strategy.commit_tag().to_string();

            let confidence = match self.evaluate(&proposal, &snapshot, 0.0) {
                Evaluation::Accepted { confidence } => confidence,
                Evaluation::Rejected { reason, confidence } => {
                    warn!(reason = reason.code(), confidence, "改派提案被拒绝");
                    let mut decision = Decision::empty(decision_id, vec![why_tag]);
                    decision.rejections.push(Rejection {
                        proposal_id: proposal.proposal_id.clone(),
                        ref_id: proposal.ref_id.clone(),
                        door_id: proposal.door_id.clone(),
                        reason,
                        confidence,
                    });
                    return Ok(decision);
                }
            };

            let assignment = build_assignment(&proposal, confidence, now);
            let assigned_event = build_assigned_event(&assignment, confidence, now);

            let competing = self.repos.assignment_repo.count_active_near(
                &proposal.door_id,
                displaced.start,
                proposal.start,
                self.competing_window_min,
                (displaced_id, &assignment.assignment_id),
            )?;
            let previous = ReassignmentParty {
                assignment_id: displaced.assignment_id.clone(),
                ref_id: displaced.ref_id.clone(),
                job_kind: displaced.job_kind,
                priority: displaced.rationale.priority,
                earliest_ready: displaced.rationale.earliest_ready,
                start: displaced.start,
            };
            let new = ReassignmentParty {
                assignment_id: assignment.assignment_id.clone(),
                ref_id: assignment.ref_id.clone(),
                job_kind: assignment.job_kind,
                priority: proposal.priority,
                earliest_ready: proposal.earliest_ready,
                start: proposal.start,
            };
            let reason_detail = self.classifier.classify(previous, new, competing);
            let reason_code = reason_detail.reason_code();

            let reassigned_event = DockEvent {
                event_id: new_id("evt"),
                ts: now,
                location: displaced.location.clone(),
                door_id: displaced.door_id.clone(),
                job_kind: Some(displaced.job_kind),
                ref_id: Some(displaced.ref_id.clone()),
                event_type: DockEventType::Reassigned,
                reason_detail,
            };

            self.repos.assignment_repo.reassign_with_events(
                displaced_id,
                &assignment,
                &assigned_event,
                &reassigned_event,
            )?;

            info!(
                displaced_id,
                assignment_id = %assignment.assignment_id,
                reason_code = reason_code.as_str(),
                "改派已提交"
            );

            let accepted = vec![AcceptedProposal {
                proposal: proposal.clone(),
                assignment_id: assignment.assignment_id,
                confidence,
            }];
            Ok(Decision {
                decision_id,
                confidence: Decision::mean_confidence(&accepted),
                accepted,
                why: vec![why_tag, reason_code.as_str().to_string()],
                rejections: Vec::new(),
                unassigned: Vec::new(),
            })
        })
    }
}
