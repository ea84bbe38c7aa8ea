pub mod d001_unit_economics;
