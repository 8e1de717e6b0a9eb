use maze_survival_core::{AgentState, CellCoord, SpeciesKind};
use maze_survival_system_stage::Stage;
use maze_survival_world::query;

const WALL: char = '#';
const FLOOR: char = ' ';
const OUTSIDE: char = '~';
const FOG: char = ':';
const ENTRANCE: char = 'E';
const EXIT: char = 'X';
const PLAYER: char = '@';
const CORPSE: char = '%';

fn species_glyph(species: SpeciesKind) -> char {
    match species {
        SpeciesKind::Crawler => 'c',
        SpeciesKind::Stalker => 's',
        SpeciesKind::Brute => 'b',
        SpeciesKind::Wraith => 'w',
    }
}

/// Draws the stage as text, one line per grid row.
///
/// Unexplored floor is drawn as fog. Agents are drawn over the floor and the
/// player over everything else.
pub(crate) fn render_ascii(stage: &Stage, player: Option<CellCoord>) -> String {
    let maze = query::maze(stage.world());
    let (columns, rows) = maze.dimensions();
    let mut glyphs: Vec<char> = Vec::with_capacity(maze.cells().len());

    for row in 0..rows {
        for column in 0..columns {
            let cell = CellCoord::new(column, row);
            let glyph = if !maze.in_mask(cell) && !maze.is_open(cell) {
                OUTSIDE
            } else if !maze.is_open(cell) {
                WALL
            } else if Some(cell) == maze.entrance() {
                ENTRANCE
            } else if Some(cell) == maze.exit() {
                EXIT
            } else if maze.is_explored(cell) {
                FLOOR
            } else {
                FOG
            };
            glyphs.push(glyph);
        }
    }

    let mut overlay = |cell: CellCoord, glyph: char| {
        if let Some(index) = maze.index(cell) {
            glyphs[index] = glyph;
        }
    };
    for agent in stage.agents().iter() {
        let glyph = if agent.state() == AgentState::Die {
            CORPSE
        } else {
            species_glyph(agent.species())
        };
        overlay(agent.cell(), glyph);
    }
    if let Some(cell) = player {
        overlay(cell, PLAYER);
    }

    let width = usize::try_from(columns).unwrap_or(usize::MAX);
    glyphs
        .chunks(width)
        .map(|line| line.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

/// One line per agent: id, species, state, cell and health.
pub(crate) fn agent_summary(stage: &Stage) -> Vec<String> {
    stage
        .agents()
        .snapshots()
        .into_iter()
        .map(|snapshot| {
            let frozen = if snapshot.frozen { " (frozen)" } else { "" };
            format!(
                "#{:<3} {:<8} {:<7} at {} hp {}{frozen}",
                snapshot.id.get(),
                format!("{:?}", snapshot.species).to_lowercase(),
                snapshot.state.tag(),
                snapshot.cell,
                snapshot.health,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use maze_survival_system_stage::StageConfig;

    #[test]
    fn map_has_one_line_per_row() {
        let stage = Stage::new(StageConfig::default(), 1, 3).expect("stage builds");
        let (columns, rows) = query::maze(stage.world()).dimensions();

        let map = render_ascii(&stage, None);

        let lines: Vec<&str> = map.lines().collect();
        assert_eq!(lines.len(), rows as usize);
        assert!(lines.iter().all(|line| line.chars().count() == columns as usize));
        assert_eq!(map.matches(ENTRANCE).count(), 1);
        assert_eq!(map.matches(EXIT).count(), 1);
    }

    #[test]
    fn player_is_drawn_over_the_entrance() {
        let stage = Stage::new(StageConfig::default(), 1, 4).expect("stage builds");
        let entrance = query::entrance(stage.world());

        let map = render_ascii(&stage, entrance);

        assert_eq!(map.matches(PLAYER).count(), 1);
        assert_eq!(map.matches(ENTRANCE).count(), 0);
    }

    #[test]
    fn summary_lists_every_agent() {
        let stage = Stage::new(StageConfig::default(), 3, 5).expect("stage builds");
        let summary = agent_summary(&stage);
        assert_eq!(summary.len(), stage.agents().len());
        assert!(summary.iter().all(|line| line.contains("hp")));
    }
}
