//! In-memory network topology.
//!
//! The network is immutable once built. Mutable operating state (switch
//! positions, feeder directions, energised phases) lives in
//! [`NetworkState`](super::NetworkState) so the same topology can be traced
//! from several threads at once.

use std::collections::{HashMap, HashSet};

use super::equipment::{ConnectivityNode, Equipment, EquipmentClass, SegmentPosition, Terminal};
use super::ids::{generate_mrid, EquipmentId, NodeId, TerminalId};
use crate::error::{GraphError, TraceError, TraceResult, ValidationError};
use crate::phase::PhaseCode;

/// Immutable equipment graph.
#[derive(Debug, Clone, Default)]
pub struct Network {
    equipment: Vec<Equipment>,
    terminals: Vec<Terminal>,
    nodes: Vec<ConnectivityNode>,
    by_mrid: HashMap<String, EquipmentId>,
    segment_attachments: HashMap<EquipmentId, Vec<EquipmentId>>,
    feeder_heads: Vec<TerminalId>,
    feeder_head_set: HashSet<TerminalId>,
}

impl Network {
    /// Starts building a network.
    #[must_use]
    pub fn builder() -> NetworkBuilder {
        NetworkBuilder::new()
    }

    /// Returns the equipment with the given id.
    ///
    /// # Panics
    /// Panics if `id` was not issued by this network.
    #[must_use]
    pub fn equipment(&self, id: EquipmentId) -> &Equipment {
        &self.equipment[id.index()]
    }

    /// Returns the terminal with the given id.
    ///
    /// # Panics
    /// Panics if `id` was not issued by this network.
    #[must_use]
    pub fn terminal(&self, id: TerminalId) -> &Terminal {
        &self.terminals[id.index()]
    }

    /// Returns the connectivity node with the given id.
    ///
    /// # Panics
    /// Panics if `id` was not issued by this network.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &ConnectivityNode {
        &self.nodes[id.index()]
    }

    /// Checked equipment lookup.
    pub fn get_equipment(&self, id: EquipmentId) -> Result<&Equipment, GraphError> {
        self.equipment
            .get(id.index())
            .ok_or(GraphError::EquipmentNotFound { id })
    }

    /// Checked terminal lookup.
    pub fn get_terminal(&self, id: TerminalId) -> Result<&Terminal, GraphError> {
        self.terminals
            .get(id.index())
            .ok_or(GraphError::TerminalNotFound { id })
    }

    /// Finds equipment by mRID.
    pub fn equipment_by_mrid(&self, mrid: &str) -> Result<&Equipment, GraphError> {
        self.by_mrid
            .get(mrid)
            .map(|id| self.equipment(*id))
            .ok_or_else(|| GraphError::UnknownMrid {
                mrid: mrid.to_string(),
            })
    }

    /// Finds the terminal with `sequence_number` on the equipment with `mrid`.
    pub fn terminal_by_mrid(&self, mrid: &str, sequence_number: u32) -> Result<TerminalId, GraphError> {
        let equipment = self.equipment_by_mrid(mrid)?;
        find_terminal(&self.terminals, equipment, sequence_number)
    }

    /// Iterates all equipment.
    pub fn equipment_iter(&self) -> impl Iterator<Item = &Equipment> {
        self.equipment.iter()
    }

    /// Number of pieces of equipment.
    #[must_use]
    pub fn equipment_count(&self) -> usize {
        self.equipment.len()
    }

    /// Number of terminals.
    #[must_use]
    pub fn terminal_count(&self) -> usize {
        self.terminals.len()
    }

    /// Terminals sharing a connectivity node with `terminal`, excluding itself.
    pub fn connected_terminals(&self, terminal: TerminalId) -> impl Iterator<Item = TerminalId> + '_ {
        self.terminal(terminal)
            .connectivity_node
            .into_iter()
            .flat_map(move |node| self.node(node).terminals.iter().copied())
            .filter(move |other| *other != terminal)
    }

    /// Cuts and clamps on `segment`, ordered by position.
    #[must_use]
    pub fn segment_attachments(&self, segment: EquipmentId) -> &[EquipmentId] {
        self.segment_attachments
            .get(&segment)
            .map_or(&[], Vec::as_slice)
    }

    /// The segment a terminal walks along, if any.
    ///
    /// Terminals of a two-terminal AC line segment and terminals of cuts and
    /// clamps attached to one take part in segment walks.
    #[must_use]
    pub fn segment_of(&self, terminal: TerminalId) -> Option<EquipmentId> {
        let equipment = self.equipment(self.terminal(terminal).equipment);
        if let Some(position) = equipment.segment_position {
            return Some(position.segment);
        }
        (equipment.class == EquipmentClass::AcLineSegment && equipment.terminals.len() == 2)
            .then_some(equipment.id)
    }

    /// Other terminals in the same section of the segment as `terminal`.
    ///
    /// Cuts divide a segment into sections: the first runs from terminal 1
    /// of the segment to terminal 1 of the first cut, the next from that
    /// cut's terminal 2 to the following cut, and the last ends at the
    /// segment's terminal 2. Clamps belong to the section containing their
    /// position, and a clamp at exactly a cut's position belongs to the
    /// section before the cut.
    #[must_use]
    pub fn segment_section_neighbours(&self, terminal: TerminalId) -> Vec<TerminalId> {
        let Some(segment) = self.segment_of(terminal) else {
            return Vec::new();
        };
        let seg = self.equipment(segment);
        let mut sections: Vec<Vec<TerminalId>> = vec![vec![seg.terminals[0]]];
        for &attached in self.segment_attachments(segment) {
            let eq = self.equipment(attached);
            if let Some(current) = sections.last_mut() {
                current.push(eq.terminals[0]);
            }
            if eq.class == EquipmentClass::Cut {
                sections.push(vec![eq.terminals[1]]);
            }
        }
        if let Some(last) = sections.last_mut() {
            last.push(seg.terminals[1]);
        }

        sections
            .into_iter()
            .find(|section| section.contains(&terminal))
            .map(|section| section.into_iter().filter(|t| *t != terminal).collect())
            .unwrap_or_default()
    }

    /// Feeder head terminals in insertion order.
    #[must_use]
    pub fn feeder_heads(&self) -> &[TerminalId] {
        &self.feeder_heads
    }

    /// Returns true if `terminal` is a feeder head.
    #[must_use]
    pub fn is_feeder_head(&self, terminal: TerminalId) -> bool {
        self.feeder_head_set.contains(&terminal)
    }
}

fn find_terminal(
    terminals: &[Terminal],
    equipment: &Equipment,
    sequence_number: u32,
) -> Result<TerminalId, GraphError> {
    equipment
        .terminals
        .iter()
        .copied()
        .find(|t| terminals[t.index()].sequence_number == sequence_number)
        .ok_or(GraphError::NoSuchTerminal {
            equipment: equipment.id,
            sequence_number,
        })
}

/// Incremental builder for a [`Network`].
///
/// # Example
/// ```
/// use gridtrace::network::{EquipmentClass, Network};
///
/// let mut b = Network::builder();
/// let source = b.add_equipment("s0", EquipmentClass::EnergySource, 1)?;
/// let line = b.add_equipment("c1", EquipmentClass::AcLineSegment, 2)?;
/// b.chain(&[source, line])?;
/// let network = b.build();
/// assert_eq!(network.terminal_count(), 3);
/// # Ok::<(), gridtrace::TraceError>(())
/// ```
#[derive(Debug, Default)]
pub struct NetworkBuilder {
    network: Network,
}

impl NetworkBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds equipment with `num_terminals` ABCN terminals.
    pub fn add_equipment(
        &mut self,
        mrid: impl Into<String>,
        class: EquipmentClass,
        num_terminals: u32,
    ) -> TraceResult<EquipmentId> {
        let phases = vec![PhaseCode::ABCN; num_terminals as usize];
        self.add_equipment_with_phases(mrid, class, &phases, PhaseCode::ABCN)
    }

    /// Adds equipment with a generated mRID.
    pub fn add_unnamed(&mut self, class: EquipmentClass, num_terminals: u32) -> TraceResult<EquipmentId> {
        self.add_equipment(generate_mrid(), class, num_terminals)
    }

    /// Adds equipment with explicit per-terminal phases and declared equipment phases.
    pub fn add_equipment_with_phases(
        &mut self,
        mrid: impl Into<String>,
        class: EquipmentClass,
        terminal_phases: &[PhaseCode],
        equipment_phases: PhaseCode,
    ) -> TraceResult<EquipmentId> {
        let mrid = mrid.into().trim().to_string();
        if mrid.is_empty() {
            return Err(ValidationError::MissingField {
                field: "mrid".to_string(),
            }
            .into());
        }
        if self.network.by_mrid.contains_key(&mrid) {
            return Err(ValidationError::DuplicateMrid { mrid }.into());
        }
        if terminal_phases.is_empty() {
            return Err(ValidationError::InvalidField {
                field: "terminals".to_string(),
                reason: format!("equipment '{mrid}' must have at least one terminal"),
            }
            .into());
        }

        let id = EquipmentId::new(to_index(self.network.equipment.len())?);
        let mut terminals = Vec::with_capacity(terminal_phases.len());
        for (i, phases) in terminal_phases.iter().enumerate() {
            let terminal_id = TerminalId::new(to_index(self.network.terminals.len())?);
            let sequence_number = to_index(i + 1)?;
            self.network.terminals.push(Terminal {
                id: terminal_id,
                mrid: format!("{mrid}-t{sequence_number}"),
                equipment: id,
                sequence_number,
                phases: *phases,
                connectivity_node: None,
            });
            terminals.push(terminal_id);
        }

        self.network.by_mrid.insert(mrid.clone(), id);
        self.network.equipment.push(Equipment {
            id,
            mrid,
            name: None,
            class,
            terminals,
            phases: equipment_phases,
            grounding_terminal: None,
            segment_position: None,
        });
        Ok(id)
    }

    /// Sets the display name of equipment.
    pub fn set_name(&mut self, equipment: EquipmentId, name: impl Into<String>) -> TraceResult<()> {
        self.equipment_mut(equipment)?.name = Some(name.into());
        Ok(())
    }

    /// Returns the terminal of `equipment` with the given 1-based sequence number.
    pub fn terminal(&self, equipment: EquipmentId, sequence_number: u32) -> TraceResult<TerminalId> {
        let eq = self.network.get_equipment(equipment)?;
        Ok(find_terminal(&self.network.terminals, eq, sequence_number)?)
    }

    /// Joins two terminals through a connectivity node, merging nodes as needed.
    pub fn connect(&mut self, a: TerminalId, b: TerminalId) -> TraceResult<NodeId> {
        let node_a = self.network.get_terminal(a)?.connectivity_node;
        let node_b = self.network.get_terminal(b)?.connectivity_node;
        if a == b {
            return Err(ValidationError::InvalidField {
                field: "terminal".to_string(),
                reason: format!("cannot connect {a} to itself"),
            }
            .into());
        }

        let node = match (node_a, node_b) {
            (Some(na), Some(nb)) if na == nb => na,
            (Some(na), Some(nb)) => {
                let moved = std::mem::take(&mut self.network.nodes[nb.index()].terminals);
                for t in &moved {
                    self.network.terminals[t.index()].connectivity_node = Some(na);
                }
                self.network.nodes[na.index()].terminals.extend(moved);
                na
            }
            (Some(na), None) => {
                self.attach(b, na);
                na
            }
            (None, Some(nb)) => {
                self.attach(a, nb);
                nb
            }
            (None, None) => {
                let node = NodeId::new(to_index(self.network.nodes.len())?);
                self.network.nodes.push(ConnectivityNode {
                    id: node,
                    terminals: Vec::new(),
                });
                self.attach(a, node);
                self.attach(b, node);
                node
            }
        };
        Ok(node)
    }

    /// Connects the last terminal of each piece of equipment to the first
    /// terminal of the next.
    pub fn chain(&mut self, equipment: &[EquipmentId]) -> TraceResult<()> {
        for pair in equipment.windows(2) {
            let from = self.network.get_equipment(pair[0])?;
            let to = self.network.get_equipment(pair[1])?;
            let (Some(&a), Some(&b)) = (from.terminals.last(), to.terminals.first()) else {
                return Err(TraceError::internal("equipment without terminals"));
            };
            self.connect(a, b)?;
        }
        Ok(())
    }

    /// Attaches a cut or clamp to an AC line segment.
    pub fn attach_to_segment(
        &mut self,
        equipment: EquipmentId,
        segment: EquipmentId,
        length_from_terminal_1: f64,
    ) -> TraceResult<()> {
        let seg = self.network.get_equipment(segment)?;
        if seg.class != EquipmentClass::AcLineSegment || seg.terminals.len() != 2 {
            return Err(GraphError::InvalidAttachment {
                reason: format!("{} is not a two-terminal AC line segment", seg.mrid),
            }
            .into());
        }
        if !length_from_terminal_1.is_finite() || length_from_terminal_1 < 0.0 {
            return Err(GraphError::InvalidAttachment {
                reason: format!("invalid length {length_from_terminal_1}"),
            }
            .into());
        }

        let eq = self.network.get_equipment(equipment)?;
        let expected_terminals = match eq.class {
            EquipmentClass::Cut => 2,
            EquipmentClass::Clamp => 1,
            other => {
                return Err(GraphError::InvalidAttachment {
                    reason: format!("{other} cannot be attached to a segment"),
                }
                .into())
            }
        };
        if eq.terminals.len() != expected_terminals {
            return Err(GraphError::InvalidAttachment {
                reason: format!("{} must have {expected_terminals} terminal(s)", eq.mrid),
            }
            .into());
        }
        if eq.segment_position.is_some() {
            return Err(GraphError::InvalidAttachment {
                reason: format!("{} is already attached", eq.mrid),
            }
            .into());
        }

        self.equipment_mut(equipment)?.segment_position = Some(SegmentPosition {
            segment,
            length_from_terminal_1,
        });
        self.network
            .segment_attachments
            .entry(segment)
            .or_default()
            .push(equipment);
        Ok(())
    }

    /// Marks the grounding terminal of a shunt compensator.
    pub fn set_grounding_terminal(&mut self, equipment: EquipmentId, terminal: TerminalId) -> TraceResult<()> {
        let eq = self.network.get_equipment(equipment)?;
        if !eq.is_instance_of(EquipmentClass::ShuntCompensator) {
            return Err(ValidationError::InvalidField {
                field: "grounding_terminal".to_string(),
                reason: format!("{} is not a shunt compensator", eq.mrid),
            }
            .into());
        }
        if !eq.terminals.contains(&terminal) {
            return Err(ValidationError::InvalidField {
                field: "grounding_terminal".to_string(),
                reason: format!("{terminal} does not belong to {}", eq.mrid),
            }
            .into());
        }
        self.equipment_mut(equipment)?.grounding_terminal = Some(terminal);
        Ok(())
    }

    /// Marks a terminal as a feeder head.
    pub fn add_feeder_head(&mut self, terminal: TerminalId) -> TraceResult<()> {
        self.network.get_terminal(terminal)?;
        if self.network.feeder_head_set.insert(terminal) {
            self.network.feeder_heads.push(terminal);
        }
        Ok(())
    }

    /// Finishes the network.
    #[must_use]
    pub fn build(mut self) -> Network {
        let equipment = &self.network.equipment;
        for attached in self.network.segment_attachments.values_mut() {
            attached.sort_by(|a, b| {
                let (ea, eb) = (&equipment[a.index()], &equipment[b.index()]);
                let pa = ea.segment_position.map_or(0.0, |p| p.length_from_terminal_1);
                let pb = eb.segment_position.map_or(0.0, |p| p.length_from_terminal_1);
                pa.total_cmp(&pb)
                    .then_with(|| (ea.class == EquipmentClass::Cut).cmp(&(eb.class == EquipmentClass::Cut)))
            });
        }
        self.network
    }

    fn attach(&mut self, terminal: TerminalId, node: NodeId) {
        self.network.terminals[terminal.index()].connectivity_node = Some(node);
        self.network.nodes[node.index()].terminals.push(terminal);
    }

    fn equipment_mut(&mut self, id: EquipmentId) -> Result<&mut Equipment, GraphError> {
        self.network
            .equipment
            .get_mut(id.index())
            .ok_or(GraphError::EquipmentNotFound { id })
    }
}

fn to_index(n: usize) -> TraceResult<u32> {
    u32::try_from(n).map_err(|_| TraceError::internal("network exceeds u32 index space"))
}
